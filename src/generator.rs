//! Generator kinds and their static field descriptors.
//!
//! Each generator kind owns a fixed table of [`FieldDescriptor`]s. The tables
//! are the only schema a UI needs to drive form rendering generically.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// The closed set of report generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeneratorKind {
    Bug,
    Story,
    Task,
    Epic,
    VerifiedComment,
}

/// Input control kind for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    SingleLine,
    MultiLine,
    Choice,
}

/// One option of a choice field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub value: &'static str,
    pub label: &'static str,
}

/// Static description of one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub id: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    #[serde(skip_serializing_if = "<[Choice]>::is_empty")]
    pub choices: &'static [Choice],
    /// Initial value for a fresh field set.
    #[serde(skip_serializing_if = "str::is_empty")]
    pub default: &'static str,
}

impl FieldDescriptor {
    const fn single(id: &'static str, label: &'static str) -> Self {
        Self {
            id,
            label,
            kind: FieldKind::SingleLine,
            placeholder: None,
            choices: &[],
            default: "",
        }
    }

    const fn multi(id: &'static str, label: &'static str) -> Self {
        Self {
            kind: FieldKind::MultiLine,
            ..Self::single(id, label)
        }
    }

    const fn choice(
        id: &'static str,
        label: &'static str,
        choices: &'static [Choice],
        default: &'static str,
    ) -> Self {
        Self {
            kind: FieldKind::Choice,
            choices,
            default,
            ..Self::single(id, label)
        }
    }

    const fn hint(self, placeholder: &'static str) -> Self {
        Self {
            placeholder: Some(placeholder),
            ..self
        }
    }
}

pub const PRIORITY_CHOICES: &[Choice] = &[
    Choice {
        value: "blocker",
        label: "Blocker",
    },
    Choice {
        value: "critical",
        label: "Critical",
    },
    Choice {
        value: "major",
        label: "Major",
    },
    Choice {
        value: "minor",
        label: "Minor",
    },
];

pub const STATUS_CHOICES: &[Choice] = &[
    Choice {
        value: "Pass",
        label: "Pass",
    },
    Choice {
        value: "Fail",
        label: "Fail",
    },
    Choice {
        value: "Blocked",
        label: "Blocked",
    },
    Choice {
        value: "Skipped",
        label: "Skipped",
    },
];

const BUG_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::single("summary", "Summary"),
    FieldDescriptor::choice("priority", "Priority", PRIORITY_CHOICES, "Major"),
    FieldDescriptor::multi("stepsToReproduce", "Steps to Reproduce")
        .hint("1. Go to...\n2. Click on..."),
    FieldDescriptor::multi("expectedResult", "Expected Result"),
    FieldDescriptor::multi("actualResult", "Actual Result"),
    FieldDescriptor::multi("environment", "Environment"),
];

const STORY_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::single("summary", "Summary"),
    FieldDescriptor::single("role", "As a...").hint("User role"),
    FieldDescriptor::single("feature", "I want...").hint("feature"),
    FieldDescriptor::single("benefit", "So that...").hint("brings what benefits"),
    FieldDescriptor::multi("acceptanceCriteria", "Acceptance Criteria"),
];

// Task and Epic share one table.
const TASK_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::single("summary", "Summary"),
    FieldDescriptor::multi("description", "Description"),
    FieldDescriptor::multi("scope", "Scope"),
];

const VERIFIED_COMMENT_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::single("summary", "Summary").hint("Brief summary of verification"),
    FieldDescriptor::single("testExecutionLink", "Test Execution Link")
        .hint("Link to test case execution"),
    FieldDescriptor::single("environment", "Environment").hint("e.g. Staging, Prod"),
    FieldDescriptor::single("platform", "Platform/OS").hint("e.g. Chrome/Mac"),
    FieldDescriptor::single("buildVersion", "Build Version").hint("e.g. v1.2.3"),
    FieldDescriptor::single("testAccounts", "Test Accounts").hint("e.g. user@example.com"),
    FieldDescriptor::single("testInfo", "Test Info (Optional)").hint("Additional context"),
    FieldDescriptor::multi("testResults", "Test Results").hint("What was observed?"),
    FieldDescriptor::choice("status", "Status", STATUS_CHOICES, "Pass"),
    FieldDescriptor::multi("evidence", "Objective Evidences")
        .hint("Links to screenshots, videos, logs..."),
    FieldDescriptor::single("cc", "CC").hint("@username"),
];

/// Which fields of a generator survive across sessions, and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetContract {
    pub key: &'static str,
    pub fields: &'static [&'static str],
}

const VERIFIED_COMMENT_PRESETS: PresetContract = PresetContract {
    key: "verified-comment-presets",
    fields: &["environment", "platform", "buildVersion", "testAccounts"],
};

impl GeneratorKind {
    pub const ALL: [GeneratorKind; 5] = [
        GeneratorKind::Bug,
        GeneratorKind::Story,
        GeneratorKind::Task,
        GeneratorKind::Epic,
        GeneratorKind::VerifiedComment,
    ];

    pub const TICKETS: [GeneratorKind; 4] = [
        GeneratorKind::Bug,
        GeneratorKind::Story,
        GeneratorKind::Task,
        GeneratorKind::Epic,
    ];

    /// Stable identifier used on the command line and in config.
    pub fn id(self) -> &'static str {
        match self {
            Self::Bug => "bug",
            Self::Story => "story",
            Self::Task => "task",
            Self::Epic => "epic",
            Self::VerifiedComment => "verified-comment",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Bug => "Bug",
            Self::Story => "Story",
            Self::Task => "Task",
            Self::Epic => "Epic",
            Self::VerifiedComment => "Verified Comment",
        }
    }

    pub fn is_ticket(self) -> bool {
        self != Self::VerifiedComment
    }

    pub fn fields(self) -> &'static [FieldDescriptor] {
        match self {
            Self::Bug => BUG_FIELDS,
            Self::Story => STORY_FIELDS,
            Self::Task | Self::Epic => TASK_FIELDS,
            Self::VerifiedComment => VERIFIED_COMMENT_FIELDS,
        }
    }

    pub fn descriptor(self, id: &str) -> Option<&'static FieldDescriptor> {
        self.fields().iter().find(|d| d.id == id)
    }

    /// File name used when the report is saved to disk.
    pub fn export_filename(self) -> String {
        match self {
            Self::VerifiedComment => "verified-comment.txt".to_string(),
            ticket => format!("{}-ticket.txt", ticket.id()),
        }
    }

    pub fn preset_contract(self) -> Option<PresetContract> {
        match self {
            Self::VerifiedComment => Some(VERIFIED_COMMENT_PRESETS),
            _ => None,
        }
    }
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for GeneratorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bug" => Ok(Self::Bug),
            "story" => Ok(Self::Story),
            "task" => Ok(Self::Task),
            "epic" => Ok(Self::Epic),
            "verified-comment" | "verified" | "comment" => Ok(Self::VerifiedComment),
            other => Err(format!(
                "unknown generator '{}' (expected bug, story, task, epic or verified-comment)",
                other
            )),
        }
    }
}
