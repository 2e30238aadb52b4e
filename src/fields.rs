//! Field store: the live values of one generator's inputs.

use thiserror::Error;
use tracing::warn;

use crate::generator::GeneratorKind;
use crate::presets::PresetRecord;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("{kind} has no field named '{id}'")]
    UnknownField { kind: GeneratorKind, id: String },
}

/// Ordered mapping from field id to current value.
///
/// A field set always holds every field its generator declares, in
/// descriptor order. It cannot gain or lose keys after initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet {
    kind: GeneratorKind,
    values: Vec<(&'static str, String)>,
}

impl FieldSet {
    /// Build a fresh field set: declared defaults first, then any preset
    /// values for the keys they cover.
    pub fn initialize(kind: GeneratorKind, presets: Option<&PresetRecord>) -> Self {
        let mut values: Vec<(&'static str, String)> = kind
            .fields()
            .iter()
            .map(|d| (d.id, d.default.to_string()))
            .collect();

        if let Some(record) = presets {
            for (id, value) in values.iter_mut() {
                if let Some(preset) = record.get(id) {
                    *value = preset.to_string();
                }
            }
        }

        Self { kind, values }
    }

    pub fn kind(&self) -> GeneratorKind {
        self.kind
    }

    /// Current value of `id`.
    ///
    /// Asking for an undeclared id is a programming error; it logs and
    /// yields the empty string.
    pub fn get(&self, id: &str) -> &str {
        match self.values.iter().find(|(k, _)| *k == id) {
            Some((_, v)) => v.as_str(),
            None => {
                warn!(kind = %self.kind, id, "field_get_unknown");
                ""
            }
        }
    }

    /// Replace the value of `id`. The value is stored verbatim, choice
    /// fields included.
    pub fn set(&mut self, id: &str, value: impl Into<String>) -> Result<(), FieldError> {
        let descriptor = self
            .kind
            .descriptor(id)
            .ok_or_else(|| FieldError::UnknownField {
                kind: self.kind,
                id: id.to_string(),
            })?;

        if let Some((_, slot)) = self.values.iter_mut().find(|(k, _)| *k == descriptor.id) {
            *slot = value.into();
        }
        Ok(())
    }

    /// Mutable access for in-place editing by the form layer.
    pub(crate) fn value_mut(&mut self, id: &str) -> Option<&mut String> {
        self.values
            .iter_mut()
            .find(|(k, _)| *k == id)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.values.iter().map(|(k, v)| (*k, v.as_str()))
    }
}
