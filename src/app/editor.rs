//! Multi-line text buffer behind the configuration editor.
//!
//! Cursor columns count characters, not bytes.

/// Text shown in a fresh editor.
pub const SEED_TEXT: &str =
    "! Do not include 'conf t', as config mode will automatically be entered and exited\n";

/// Editing operations the key map can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    Insert(char),
    Newline,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEditor {
    lines: Vec<String>,
    row: usize,
    col: usize,
    loading: bool,
}

impl Default for ConfigEditor {
    fn default() -> Self {
        let mut editor = Self::new(SEED_TEXT);
        editor.set_cursor(1, 0);
        editor
    }
}

impl ConfigEditor {
    pub fn new(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(str::to_string).collect(),
            row: 0,
            col: 0,
            loading: false,
        }
    }

    /// Full buffer contents, lines joined with `'\n'`.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Replaces the whole buffer and puts the cursor at the start.
    pub fn load_text(&mut self, text: &str) {
        self.lines = text.split('\n').map(str::to_string).collect();
        self.row = 0;
        self.col = 0;
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// `(row, column)` of the cursor.
    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    /// Moves the cursor, clamped to the buffer.
    pub fn set_cursor(&mut self, row: usize, col: usize) {
        self.row = row.min(self.lines.len().saturating_sub(1));
        self.col = col.min(self.line_len(self.row));
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn apply(&mut self, action: EditorAction) {
        match action {
            EditorAction::Insert(c) => self.insert_char(c),
            EditorAction::Newline => self.newline(),
            EditorAction::Backspace => self.backspace(),
            EditorAction::Delete => self.delete(),
            EditorAction::Left => self.move_left(),
            EditorAction::Right => self.move_right(),
            EditorAction::Up => self.set_cursor(self.row.saturating_sub(1), self.col),
            EditorAction::Down => self.set_cursor(self.row + 1, self.col),
            EditorAction::Home => self.col = 0,
            EditorAction::End => self.col = self.line_len(self.row),
        }
    }

    fn line_len(&self, row: usize) -> usize {
        self.lines.get(row).map_or(0, |line| line.chars().count())
    }

    fn byte_offset(&self, row: usize, col: usize) -> usize {
        let line = &self.lines[row];
        line.char_indices()
            .nth(col)
            .map_or(line.len(), |(offset, _)| offset)
    }

    fn insert_char(&mut self, c: char) {
        let offset = self.byte_offset(self.row, self.col);
        self.lines[self.row].insert(offset, c);
        self.col += 1;
    }

    fn newline(&mut self) {
        let offset = self.byte_offset(self.row, self.col);
        let rest = self.lines[self.row].split_off(offset);
        self.lines.insert(self.row + 1, rest);
        self.row += 1;
        self.col = 0;
    }

    fn backspace(&mut self) {
        if self.col > 0 {
            let offset = self.byte_offset(self.row, self.col - 1);
            self.lines[self.row].remove(offset);
            self.col -= 1;
        } else if self.row > 0 {
            let current = self.lines.remove(self.row);
            self.row -= 1;
            self.col = self.line_len(self.row);
            self.lines[self.row].push_str(&current);
        }
    }

    fn delete(&mut self) {
        if self.col < self.line_len(self.row) {
            let offset = self.byte_offset(self.row, self.col);
            self.lines[self.row].remove(offset);
        } else if self.row + 1 < self.lines.len() {
            let next = self.lines.remove(self.row + 1);
            self.lines[self.row].push_str(&next);
        }
    }

    fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = self.line_len(self.row);
        }
    }

    fn move_right(&mut self) {
        if self.col < self.line_len(self.row) {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }
}
