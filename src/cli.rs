//! Non-interactive subcommands for scripting.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Subcommand};
use serde_json::Value;
use tracing::info;

use crate::fields::FieldSet;
use crate::generator::GeneratorKind;
use crate::output::{self, Clipboard};
use crate::presets::{self, KeyValueStore};
use crate::templates;

/// Parse `id=value`. The value may itself contain `=`.
pub fn parse_assignment(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((id, value)) if !id.trim().is_empty() => {
            Ok((id.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected ID=VALUE, got '{}'", s)),
    }
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Generator to render: bug, story, task, epic or verified-comment
    pub kind: GeneratorKind,
    /// Set a field, e.g. --set summary="Login fails"
    #[arg(long = "set", value_name = "ID=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, String)>,
    /// JSON file holding an object of field values
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,
    /// Write the report to this file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
    /// Copy the report to the system clipboard
    #[arg(long)]
    pub copy: bool,
    /// Ignore saved presets
    #[arg(long)]
    pub no_presets: bool,
}

#[derive(Debug, Subcommand)]
pub enum PresetsAction {
    /// Print the saved verified comment presets as JSON
    Show,
    /// Save preset fields, merged over the current record
    Save {
        #[arg(long = "set", value_name = "ID=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
    },
    /// Delete the saved presets
    Clear,
}

/// Apply a JSON object of string values onto `fields`.
fn apply_json(fields: &mut FieldSet, json: &str) -> Result<()> {
    let value: Value = serde_json::from_str(json).context("Input is not valid JSON")?;
    let Value::Object(object) = value else {
        bail!("Input must be a JSON object of field values");
    };
    for (id, value) in object {
        let text = match value {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => bail!("Field '{}' must be a string, got {}", id, other),
        };
        fields.set(&id, text)?;
    }
    Ok(())
}

/// Build the field set for `render`: defaults, presets, input file, then `--set`.
pub fn build_fields(args: &RenderArgs, store: &dyn KeyValueStore) -> Result<FieldSet> {
    let record = if args.no_presets {
        Default::default()
    } else {
        presets::load(store, args.kind)
    };
    let presets = (!record.is_empty()).then_some(&record);
    let mut fields = FieldSet::initialize(args.kind, presets);

    if let Some(path) = &args.input {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        apply_json(&mut fields, &json)?;
    }
    for (id, value) in &args.set {
        fields.set(id, value.as_str())?;
    }
    Ok(fields)
}

/// Split an output path into the directory and file name to write.
fn split_output(path: &Path) -> Result<(PathBuf, String)> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("Output path {} has no file name", path.display()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, filename.to_string()))
}

pub fn run_render(
    args: &RenderArgs,
    store: &dyn KeyValueStore,
    clipboard: &mut dyn Clipboard,
    out: &mut dyn Write,
) -> Result<()> {
    let fields = build_fields(args, store)?;
    let report = templates::render(args.kind, &fields);
    info!(kind = %args.kind, bytes = report.len(), "cli_render");

    if args.copy {
        if clipboard.holds_until_replaced() {
            eprintln!("Serving the report on the clipboard until something else is copied (Ctrl-C to stop)");
            output::copy_to_clipboard(clipboard, &report)?;
        } else {
            output::copy_to_clipboard(clipboard, &report)?;
            eprintln!("Copied to clipboard");
        }
    }
    if let Some(path) = &args.output {
        let (dir, filename) = split_output(path)?;
        let saved = output::download_as_file(&dir, &filename, &report)?;
        eprintln!("Saved {}", saved.display());
    }
    if !args.copy && args.output.is_none() {
        out.write_all(report.as_bytes())?;
        out.flush()?;
    }
    Ok(())
}

/// Print a generator's field descriptors as pretty JSON.
pub fn run_fields(kind: GeneratorKind, out: &mut dyn Write) -> Result<()> {
    let json = serde_json::to_string_pretty(kind.fields())?;
    writeln!(out, "{}", json)?;
    Ok(())
}

pub fn run_presets(
    action: &PresetsAction,
    store: &mut dyn KeyValueStore,
    out: &mut dyn Write,
) -> Result<()> {
    let kind = GeneratorKind::VerifiedComment;
    match action {
        PresetsAction::Show => {
            let record = presets::load(store, kind);
            let object: serde_json::Map<String, Value> = record
                .iter()
                .map(|(id, value)| (id.to_string(), Value::String(value.to_string())))
                .collect();
            writeln!(out, "{}", serde_json::to_string_pretty(&Value::Object(object))?)?;
        }
        PresetsAction::Save { set } => {
            let contract = kind
                .preset_contract()
                .ok_or(presets::PresetError::Unsupported(kind))?;
            let record = presets::load(store, kind);
            let mut fields = FieldSet::initialize(kind, Some(&record));
            for (id, value) in set {
                if !contract.fields.contains(&id.as_str()) {
                    bail!(
                        "'{}' is not a preset field (expected one of: {})",
                        id,
                        contract.fields.join(", ")
                    );
                }
                fields.set(id, value.as_str())?;
            }
            presets::save(store, &fields)?;
            writeln!(out, "Presets saved")?;
        }
        PresetsAction::Clear => {
            presets::clear(store, kind)?;
            writeln!(out, "Presets cleared")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::MemoryStore;

    struct NoClipboard;

    impl Clipboard for NoClipboard {
        fn set_text(&mut self, _text: &str) -> Result<(), String> {
            Err("no display".to_string())
        }
    }

    #[derive(Default)]
    struct HoldingClipboard {
        contents: Option<String>,
    }

    impl Clipboard for HoldingClipboard {
        fn set_text(&mut self, text: &str) -> Result<(), String> {
            self.contents = Some(text.to_string());
            Ok(())
        }

        fn holds_until_replaced(&self) -> bool {
            true
        }
    }

    fn render_args(kind: GeneratorKind) -> RenderArgs {
        RenderArgs {
            kind,
            set: Vec::new(),
            input: None,
            output: None,
            copy: false,
            no_presets: false,
        }
    }

    fn stored_presets() -> MemoryStore {
        let mut store = MemoryStore::default();
        store
            .set(
                "verified-comment-presets",
                r#"{"environment":"Staging","platform":"Chrome/Mac","buildVersion":"v1.2.3","testAccounts":"qa@example.com"}"#,
            )
            .unwrap();
        store
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("summary=a=b").unwrap(),
            ("summary".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_assignment("cc=").unwrap(),
            ("cc".to_string(), String::new())
        );
        assert!(parse_assignment("summary").is_err());
        assert!(parse_assignment("=x").is_err());
    }

    #[test]
    fn test_render_to_writer_exact_bytes() {
        let mut args = render_args(GeneratorKind::Task);
        args.set = vec![
            ("summary".to_string(), "Upgrade deps".to_string()),
            ("description".to_string(), "Bump ratatui".to_string()),
            ("scope".to_string(), "Cargo.toml".to_string()),
        ];
        let mut out = Vec::new();
        run_render(&args, &MemoryStore::default(), &mut NoClipboard, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "*Summary:* Upgrade deps\n\n*Description:*\nBump ratatui\n\n*Scope:*\nCargo.toml"
        );
    }

    #[test]
    fn test_render_uses_presets_unless_disabled() {
        let store = stored_presets();
        let args = render_args(GeneratorKind::VerifiedComment);
        let fields = build_fields(&args, &store).unwrap();
        assert_eq!(fields.get("environment"), "Staging");

        let mut args = render_args(GeneratorKind::VerifiedComment);
        args.no_presets = true;
        let fields = build_fields(&args, &store).unwrap();
        assert_eq!(fields.get("environment"), "");
    }

    #[test]
    fn test_set_overrides_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bug.json");
        std::fs::write(&input, r#"{"summary":"from file","priority":"critical"}"#).unwrap();

        let mut args = render_args(GeneratorKind::Bug);
        args.input = Some(input);
        args.set = vec![("summary".to_string(), "from flag".to_string())];
        let fields = build_fields(&args, &MemoryStore::default()).unwrap();
        assert_eq!(fields.get("summary"), "from flag");
        assert_eq!(fields.get("priority"), "critical");
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let mut args = render_args(GeneratorKind::Story);
        args.set = vec![("priority".to_string(), "Major".to_string())];
        let err = build_fields(&args, &MemoryStore::default()).unwrap_err();
        assert!(err.to_string().contains("priority"));
    }

    #[test]
    fn test_non_string_input_is_rejected() {
        let mut fields = FieldSet::initialize(GeneratorKind::Task, None);
        assert!(apply_json(&mut fields, r#"{"summary": 3}"#).is_err());
        assert!(apply_json(&mut fields, r#"["summary"]"#).is_err());
        apply_json(&mut fields, r#"{"summary": null}"#).unwrap();
        assert_eq!(fields.get("summary"), "");
    }

    #[test]
    fn test_render_to_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = render_args(GeneratorKind::Epic);
        args.output = Some(dir.path().join("out").join("epic.txt"));
        let mut out = Vec::new();
        run_render(&args, &MemoryStore::default(), &mut NoClipboard, &mut out).unwrap();

        assert!(out.is_empty());
        let written = std::fs::read_to_string(dir.path().join("out").join("epic.txt")).unwrap();
        assert!(written.starts_with("*Summary:* \n"));
    }

    #[test]
    fn test_render_copy_failure_is_error() {
        let mut args = render_args(GeneratorKind::Task);
        args.copy = true;
        let mut out = Vec::new();
        let err = run_render(&args, &MemoryStore::default(), &mut NoClipboard, &mut out)
            .unwrap_err();
        assert!(err.to_string().contains("no display"));
    }

    #[test]
    fn test_render_copy_to_holding_clipboard() {
        let mut args = render_args(GeneratorKind::Task);
        args.copy = true;
        args.set = vec![("summary".to_string(), "Ship it".to_string())];
        let mut clipboard = HoldingClipboard::default();
        let mut out = Vec::new();
        run_render(&args, &MemoryStore::default(), &mut clipboard, &mut out).unwrap();

        assert!(out.is_empty());
        let copied = clipboard.contents.unwrap();
        assert!(copied.starts_with("*Summary:* Ship it\n"));
    }

    #[test]
    fn test_split_output() {
        let (dir, name) = split_output(Path::new("report.txt")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, "report.txt");
        assert!(split_output(Path::new("/")).is_err());
    }

    #[test]
    fn test_fields_prints_schema() {
        let mut out = Vec::new();
        run_fields(GeneratorKind::Bug, &mut out).unwrap();
        let value: Value = serde_json::from_slice(&out).unwrap();
        let fields = value.as_array().unwrap();
        assert_eq!(fields[0]["id"], "summary");
        assert_eq!(fields[1]["kind"], "choice");
        assert_eq!(fields[1]["default"], "Major");
    }

    #[test]
    fn test_presets_save_show_clear() {
        let mut store = MemoryStore::default();
        let mut out = Vec::new();
        let save = PresetsAction::Save {
            set: vec![("platform".to_string(), "Android 14".to_string())],
        };
        run_presets(&save, &mut store, &mut out).unwrap();

        let mut shown = Vec::new();
        run_presets(&PresetsAction::Show, &mut store, &mut shown).unwrap();
        let value: Value = serde_json::from_slice(&shown).unwrap();
        assert_eq!(value["platform"], "Android 14");
        assert_eq!(value["environment"], "");

        run_presets(&PresetsAction::Clear, &mut store, &mut out).unwrap();
        assert!(presets::load(&store, GeneratorKind::VerifiedComment).is_empty());
    }

    #[test]
    fn test_presets_save_rejects_non_preset_field() {
        let mut store = MemoryStore::default();
        let save = PresetsAction::Save {
            set: vec![("summary".to_string(), "x".to_string())],
        };
        let err = run_presets(&save, &mut store, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("not a preset field"));
    }
}
