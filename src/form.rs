//! Editing state for one generator's form and its key handling.

use crossterm::event::{KeyCode, KeyModifiers};

use crate::fields::FieldSet;
use crate::generator::{FieldDescriptor, FieldKind, GeneratorKind};
use crate::presets::PresetRecord;

/// A generator's field set plus the focused field and text cursor.
#[derive(Debug, Clone)]
pub struct FormState {
    pub fields: FieldSet,
    /// Index into the generator's descriptor table.
    pub focus: usize,
    /// Cursor position within the focused value, in chars.
    pub cursor: usize,
}

impl FormState {
    pub fn new(kind: GeneratorKind, presets: Option<&PresetRecord>) -> Self {
        let fields = FieldSet::initialize(kind, presets);
        let mut state = Self {
            fields,
            focus: 0,
            cursor: 0,
        };
        state.cursor = state.value_len();
        state
    }

    pub fn kind(&self) -> GeneratorKind {
        self.fields.kind()
    }

    pub fn focused(&self) -> &'static FieldDescriptor {
        &self.kind().fields()[self.focus]
    }

    fn value(&self) -> &str {
        self.fields.get(self.focused().id)
    }

    fn value_len(&self) -> usize {
        self.value().chars().count()
    }

    /// Move focus to the next field, wrapping, with the cursor at the end.
    pub fn focus_next(&mut self) {
        let count = self.kind().fields().len();
        self.focus = (self.focus + 1) % count;
        self.cursor = self.value_len();
    }

    /// Move focus to the previous field, wrapping, with the cursor at the end.
    pub fn focus_prev(&mut self) {
        let count = self.kind().fields().len();
        self.focus = (self.focus + count - 1) % count;
        self.cursor = self.value_len();
    }

    /// Insert a character at the cursor. Choice fields ignore typing.
    pub fn insert_char(&mut self, c: char) {
        let descriptor = self.focused();
        if descriptor.kind == FieldKind::Choice {
            return;
        }
        if c == '\n' && descriptor.kind != FieldKind::MultiLine {
            return;
        }
        let cursor = self.cursor;
        if let Some(value) = self.fields.value_mut(descriptor.id) {
            let at = byte_index(value, cursor);
            value.insert(at, c);
            self.cursor += 1;
        }
    }

    /// Delete the character before the cursor (backspace).
    pub fn delete_char_before(&mut self) {
        if self.cursor == 0 || self.focused().kind == FieldKind::Choice {
            return;
        }
        let cursor = self.cursor;
        let id = self.focused().id;
        if let Some(value) = self.fields.value_mut(id) {
            let at = byte_index(value, cursor - 1);
            value.remove(at);
            self.cursor -= 1;
        }
    }

    /// Delete the character at the cursor (delete key).
    pub fn delete_char_at(&mut self) {
        if self.focused().kind == FieldKind::Choice || self.cursor >= self.value_len() {
            return;
        }
        let cursor = self.cursor;
        let id = self.focused().id;
        if let Some(value) = self.fields.value_mut(id) {
            let at = byte_index(value, cursor);
            value.remove(at);
        }
    }

    pub fn cursor_left(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    pub fn cursor_right(&mut self) {
        if self.cursor < self.value_len() {
            self.cursor += 1;
        }
    }

    /// Move the cursor to the start of its line.
    pub fn cursor_home(&mut self) {
        let before: Vec<char> = self.value().chars().take(self.cursor).collect();
        self.cursor = match before.iter().rposition(|&c| c == '\n') {
            Some(newline) => newline + 1,
            None => 0,
        };
    }

    /// Move the cursor to the end of its line.
    pub fn cursor_end(&mut self) {
        let after = self.value().chars().skip(self.cursor);
        let mut offset = 0;
        for c in after {
            if c == '\n' {
                break;
            }
            offset += 1;
        }
        self.cursor += offset;
    }

    /// Select the next choice of a choice field, wrapping.
    pub fn choice_next(&mut self) {
        self.step_choice(1);
    }

    /// Select the previous choice of a choice field, wrapping.
    pub fn choice_prev(&mut self) {
        self.step_choice(-1);
    }

    fn step_choice(&mut self, step: isize) {
        let descriptor = self.focused();
        let choices = descriptor.choices;
        if descriptor.kind != FieldKind::Choice || choices.is_empty() {
            return;
        }
        let len = choices.len() as isize;
        let next = match choices.iter().position(|c| c.label == self.value()) {
            Some(current) => (current as isize + step).rem_euclid(len),
            // A value outside the choice list restarts at the first choice
            None => 0,
        };
        if let Some(value) = self.fields.value_mut(descriptor.id) {
            *value = choices[next as usize].label.to_string();
        }
        self.cursor = 0;
    }

    /// Reset every field to defaults plus `presets`, keeping focus.
    pub fn reset(&mut self, presets: Option<&PresetRecord>) {
        self.fields = FieldSet::initialize(self.kind(), presets);
        self.cursor = self.value_len();
    }
}

/// Byte offset of the `char_index`-th char of `s`, or `s.len()` past the end.
fn byte_index(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Handle an editing key for the form. Returns whether the key was consumed.
pub fn handle_form_input(form: &mut FormState, key_code: KeyCode, modifiers: KeyModifiers) -> bool {
    let kind = form.focused().kind;
    match key_code {
        KeyCode::Tab => {
            if modifiers.contains(KeyModifiers::SHIFT) {
                form.focus_prev();
            } else {
                form.focus_next();
            }
        }
        KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
        KeyCode::Down => form.focus_next(),

        // Enter breaks lines in multi-line fields, otherwise advances
        KeyCode::Enter => {
            if kind == FieldKind::MultiLine {
                form.insert_char('\n');
            } else {
                form.focus_next();
            }
        }

        KeyCode::Char(c)
            if !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            if kind == FieldKind::Choice && c == ' ' {
                form.choice_next();
            } else {
                form.insert_char(c);
            }
        }

        KeyCode::Backspace => form.delete_char_before(),
        KeyCode::Delete => form.delete_char_at(),

        KeyCode::Left => match kind {
            FieldKind::Choice => form.choice_prev(),
            _ => form.cursor_left(),
        },
        KeyCode::Right => match kind {
            FieldKind::Choice => form.choice_next(),
            _ => form.cursor_right(),
        },
        KeyCode::Home => form.cursor_home(),
        KeyCode::End => form.cursor_end(),

        _ => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn focus_on(form: &mut FormState, id: &str) {
        while form.focused().id != id {
            form.focus_next();
        }
    }

    fn type_str(form: &mut FormState, s: &str) {
        for c in s.chars() {
            handle_form_input(form, KeyCode::Char(c), KeyModifiers::NONE);
        }
    }

    #[test]
    fn test_focus_cycles_through_all_fields() {
        let mut form = FormState::new(GeneratorKind::Task, None);
        assert_eq!(form.focused().id, "summary");
        form.focus_next();
        assert_eq!(form.focused().id, "description");
        form.focus_next();
        assert_eq!(form.focused().id, "scope");
        form.focus_next();
        assert_eq!(form.focused().id, "summary");
        form.focus_prev();
        assert_eq!(form.focused().id, "scope");
    }

    #[test]
    fn test_typing_edits_focused_field() {
        let mut form = FormState::new(GeneratorKind::Bug, None);
        type_str(&mut form, "Login fails");
        assert_eq!(form.fields.get("summary"), "Login fails");
        assert_eq!(form.cursor, 11);
    }

    #[test]
    fn test_insert_in_middle_and_unicode() {
        let mut form = FormState::new(GeneratorKind::Task, None);
        type_str(&mut form, "héllo");
        form.cursor_left();
        form.cursor_left();
        type_str(&mut form, "✓");
        assert_eq!(form.fields.get("summary"), "hél✓lo");

        form.delete_char_before();
        assert_eq!(form.fields.get("summary"), "héllo");
        form.cursor_home();
        form.delete_char_at();
        assert_eq!(form.fields.get("summary"), "éllo");
    }

    #[test]
    fn test_backspace_at_start_is_noop() {
        let mut form = FormState::new(GeneratorKind::Task, None);
        form.delete_char_before();
        assert_eq!(form.fields.get("summary"), "");
        assert_eq!(form.cursor, 0);
    }

    #[test]
    fn test_enter_in_multi_line_inserts_newline() {
        let mut form = FormState::new(GeneratorKind::Bug, None);
        focus_on(&mut form, "stepsToReproduce");
        type_str(&mut form, "1. Open app");
        handle_form_input(&mut form, KeyCode::Enter, KeyModifiers::NONE);
        type_str(&mut form, "2. Tap login");
        assert_eq!(form.fields.get("stepsToReproduce"), "1. Open app\n2. Tap login");
        assert_eq!(form.focused().id, "stepsToReproduce");
    }

    #[test]
    fn test_enter_in_single_line_advances() {
        let mut form = FormState::new(GeneratorKind::Story, None);
        handle_form_input(&mut form, KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(form.focused().id, "role");
        assert_eq!(form.fields.get("summary"), "");
    }

    #[test]
    fn test_home_end_work_per_line() {
        let mut form = FormState::new(GeneratorKind::Task, None);
        focus_on(&mut form, "description");
        type_str(&mut form, "ab");
        form.insert_char('\n');
        type_str(&mut form, "cde");
        form.cursor_home();
        assert_eq!(form.cursor, 3);
        form.cursor_left();
        form.cursor_home();
        assert_eq!(form.cursor, 0);
        form.cursor_end();
        assert_eq!(form.cursor, 2);
    }

    #[test]
    fn test_choice_cycles_and_ignores_typing() {
        let mut form = FormState::new(GeneratorKind::Bug, None);
        focus_on(&mut form, "priority");
        assert_eq!(form.fields.get("priority"), "Major");

        handle_form_input(&mut form, KeyCode::Right, KeyModifiers::NONE);
        assert_eq!(form.fields.get("priority"), "Minor");
        handle_form_input(&mut form, KeyCode::Right, KeyModifiers::NONE);
        assert_eq!(form.fields.get("priority"), "Blocker");
        handle_form_input(&mut form, KeyCode::Left, KeyModifiers::NONE);
        assert_eq!(form.fields.get("priority"), "Minor");

        type_str(&mut form, "x");
        assert_eq!(form.fields.get("priority"), "Minor");
    }

    #[test]
    fn test_choice_outside_list_restarts_at_first() {
        let mut form = FormState::new(GeneratorKind::VerifiedComment, None);
        form.fields.set("status", "Flaky").unwrap();
        focus_on(&mut form, "status");
        form.choice_next();
        assert_eq!(form.fields.get("status"), "Pass");
    }

    #[test]
    fn test_control_chords_not_consumed() {
        let mut form = FormState::new(GeneratorKind::Task, None);
        let consumed = handle_form_input(&mut form, KeyCode::Char('y'), KeyModifiers::CONTROL);
        assert!(!consumed);
        assert_eq!(form.fields.get("summary"), "");
    }

    #[test]
    fn test_reset_applies_presets() {
        let mut form = FormState::new(GeneratorKind::VerifiedComment, None);
        type_str(&mut form, "draft");
        let record = PresetRecord::from_pairs([("environment", "Staging")]);
        form.reset(Some(&record));
        assert_eq!(form.fields.get("summary"), "");
        assert_eq!(form.fields.get("environment"), "Staging");
    }
}
