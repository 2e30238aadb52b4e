//! Report templates in Jira wiki markup.
//!
//! Output is consumed by Jira's renderer, so the asterisks, colons and the
//! `{color:...}` wrapper must come out byte for byte. Every heading renders
//! even when its field is empty.

use crate::fields::FieldSet;
use crate::generator::GeneratorKind;

/// Render `fields` with the template for `kind`.
pub fn render(kind: GeneratorKind, fields: &FieldSet) -> String {
    let f = |id: &str| fields.get(id);
    match kind {
        GeneratorKind::Bug => format!(
            "*Summary:* {}\n\n\
             *Steps to Reproduce:*\n{}\n\n\
             *Expected Result:*\n{}\n\n\
             *Actual Result:*\n{}\n\n\
             *Environment:*\n{}\n\n\
             *Priority:* {}",
            f("summary"),
            f("stepsToReproduce"),
            f("expectedResult"),
            f("actualResult"),
            f("environment"),
            f("priority"),
        ),
        GeneratorKind::Story => format!(
            "*Summary:* {}\n\n\
             *User Story:*\n\
             As a {}, I want {}, so that {}.\n\n\
             *Acceptance Criteria:*\n{}",
            f("summary"),
            f("role"),
            f("feature"),
            f("benefit"),
            f("acceptanceCriteria"),
        ),
        GeneratorKind::Task | GeneratorKind::Epic => format!(
            "*Summary:* {}\n\n\
             *Description:*\n{}\n\n\
             *Scope:*\n{}",
            f("summary"),
            f("description"),
            f("scope"),
        ),
        GeneratorKind::VerifiedComment => render_verified_comment(fields),
    }
}

fn render_verified_comment(fields: &FieldSet) -> String {
    let f = |id: &str| fields.get(id);
    let test_info = f("testInfo");
    // The slot stays even when empty, leaving a blank line.
    let test_info_line = if test_info.is_empty() {
        String::new()
    } else {
        format!("*   *Test Info:* {}", test_info)
    };
    let status = f("status");

    format!(
        "*Summary:* {}\n\n\
         *Test Execution Link:*\n{}\n\n\
         *Test Data:*\n\
         *   *Environment:* {}\n\
         *   *Platform/OS:* {}\n\
         *   *Build Version:* {}\n\
         *   *Test Accounts:* {}\n\
         {}\n\n\
         *Test Results:*\n{}\n\n\
         *Status:* {{color:{}}}{}{{color}}\n\n\
         *Objective Evidences:*\n{}\n\n\
         *cc:* {}",
        f("summary"),
        f("testExecutionLink"),
        f("environment"),
        f("platform"),
        f("buildVersion"),
        f("testAccounts"),
        test_info_line,
        f("testResults"),
        status_color(status),
        status,
        f("evidence"),
        f("cc"),
    )
}

/// Jira color name for a verification status. Unknown statuses fall back to
/// black.
pub fn status_color(status: &str) -> &'static str {
    match status {
        "Pass" => "green",
        "Fail" => "red",
        "Blocked" => "orange",
        "Skipped" => "gray",
        _ => "black",
    }
}
