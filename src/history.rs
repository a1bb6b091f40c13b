// Copyright (c) 2026 rezky_nightky

/// Submitted commands plus the Up/Down recall cursor.
///
/// `cursor == entries.len()` means the user is editing a fresh line; the
/// text they had typed before browsing is kept in `draft`.
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<String>,
    cursor: usize,
    draft: Option<String>,
}

impl History {
    pub fn push(&mut self, cmd: &str) {
        self.entries.push(cmd.to_string());
        self.cursor = self.entries.len();
        self.draft = None;
    }

    pub fn up(&mut self, current: &str) -> Option<&str> {
        if self.cursor == 0 {
            return None;
        }
        if self.cursor == self.entries.len() {
            self.draft = Some(current.to_string());
        }
        self.cursor -= 1;
        self.entries.get(self.cursor).map(String::as_str)
    }

    pub fn down(&mut self) -> Option<String> {
        if self.cursor >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        if self.cursor == self.entries.len() {
            Some(self.draft.take().unwrap_or_default())
        } else {
            self.entries.get(self.cursor).cloned()
        }
    }
}
