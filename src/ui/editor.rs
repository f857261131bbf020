//! Multi-line text buffer behind the editor pane.
//!
//! Cursor columns are char indices into the current line, not byte offsets.

use crate::playground::TextSurface;

#[derive(Debug, Clone)]
pub struct EditorBuffer {
    lines: Vec<String>,
    row: usize,
    col: usize,
    /// First visible line.
    pub scroll: usize,
    tab_width: usize,
}

impl EditorBuffer {
    pub fn new(text: &str, tab_width: usize) -> Self {
        let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
        if lines.is_empty() {
            lines.push(String::new());
        }
        Self {
            lines,
            row: 0,
            col: 0,
            scroll: 0,
            tab_width: tab_width.max(1),
        }
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// `(row, col)` of the cursor.
    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    fn line_len(&self, row: usize) -> usize {
        self.lines[row].chars().count()
    }

    fn byte_index(&self, row: usize, col: usize) -> usize {
        let line = &self.lines[row];
        line.char_indices()
            .nth(col)
            .map(|(i, _)| i)
            .unwrap_or(line.len())
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.row, self.col);
        self.lines[self.row].insert(at, c);
        self.col += 1;
    }

    /// Inserts spaces up to the next tab stop.
    pub fn insert_tab(&mut self) {
        let spaces = self.tab_width - (self.col % self.tab_width);
        for _ in 0..spaces {
            self.insert_char(' ');
        }
    }

    pub fn newline(&mut self) {
        let at = self.byte_index(self.row, self.col);
        let rest = self.lines[self.row].split_off(at);
        self.lines.insert(self.row + 1, rest);
        self.row += 1;
        self.col = 0;
    }

    /// Deletes the char before the cursor, joining lines at column 0.
    pub fn backspace(&mut self) -> bool {
        if self.col > 0 {
            let start = self.byte_index(self.row, self.col - 1);
            let end = self.byte_index(self.row, self.col);
            self.lines[self.row].replace_range(start..end, "");
            self.col -= 1;
            true
        } else if self.row > 0 {
            let line = self.lines.remove(self.row);
            self.row -= 1;
            self.col = self.line_len(self.row);
            self.lines[self.row].push_str(&line);
            true
        } else {
            false
        }
    }

    /// Deletes the char under the cursor, joining the next line at the end.
    pub fn delete(&mut self) -> bool {
        if self.col < self.line_len(self.row) {
            let start = self.byte_index(self.row, self.col);
            let end = self.byte_index(self.row, self.col + 1);
            self.lines[self.row].replace_range(start..end, "");
            true
        } else if self.row + 1 < self.lines.len() {
            let next = self.lines.remove(self.row + 1);
            self.lines[self.row].push_str(&next);
            true
        } else {
            false
        }
    }

    pub fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = self.line_len(self.row);
        }
    }

    pub fn move_right(&mut self) {
        if self.col < self.line_len(self.row) {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    pub fn move_up(&mut self, n: usize) {
        self.row = self.row.saturating_sub(n);
        self.col = self.col.min(self.line_len(self.row));
    }

    pub fn move_down(&mut self, n: usize) {
        self.row = (self.row + n).min(self.lines.len() - 1);
        self.col = self.col.min(self.line_len(self.row));
    }

    pub fn home(&mut self) {
        self.col = 0;
    }

    pub fn end(&mut self) {
        self.col = self.line_len(self.row);
    }

    /// Adjusts `scroll` so the cursor row is inside a viewport of `height`.
    pub fn follow_cursor(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.row < self.scroll {
            self.scroll = self.row;
        } else if self.row >= self.scroll + height {
            self.scroll = self.row + 1 - height;
        }
    }
}

impl TextSurface for EditorBuffer {
    fn value(&self) -> String {
        self.text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_newline() {
        let mut buf = EditorBuffer::new("", 2);
        for c in "ab".chars() {
            buf.insert_char(c);
        }
        buf.move_left();
        buf.newline();
        assert_eq!(buf.text(), "a\nb");
        assert_eq!(buf.cursor(), (1, 0));
    }

    #[test]
    fn test_backspace_joins_lines() {
        let mut buf = EditorBuffer::new("one\ntwo", 2);
        buf.move_down(1);
        assert!(buf.backspace());
        assert_eq!(buf.text(), "onetwo");
        assert_eq!(buf.cursor(), (0, 3));
    }

    #[test]
    fn test_delete_at_end_of_buffer_is_noop() {
        let mut buf = EditorBuffer::new("x", 2);
        buf.end();
        assert!(!buf.delete());
        assert_eq!(buf.text(), "x");
    }

    #[test]
    fn test_tab_inserts_to_next_stop() {
        let mut buf = EditorBuffer::new("", 4);
        buf.insert_char('a');
        buf.insert_tab();
        assert_eq!(buf.text(), "a   ");
    }

    #[test]
    fn test_multibyte_editing() {
        let mut buf = EditorBuffer::new("é€", 2);
        buf.move_right();
        assert!(buf.delete());
        assert_eq!(buf.text(), "é");
        assert!(buf.backspace());
        assert_eq!(buf.text(), "");
    }

    #[test]
    fn test_vertical_moves_clamp_column() {
        let mut buf = EditorBuffer::new("long line\nab\nlonger line", 2);
        buf.end();
        buf.move_down(1);
        assert_eq!(buf.cursor(), (1, 2));
        buf.move_down(10);
        assert_eq!(buf.cursor(), (2, 2));
    }

    #[test]
    fn test_follow_cursor() {
        let mut buf = EditorBuffer::new("1\n2\n3\n4\n5\n6", 2);
        buf.move_down(5);
        buf.follow_cursor(3);
        assert_eq!(buf.scroll, 3);
        buf.move_up(5);
        buf.follow_cursor(3);
        assert_eq!(buf.scroll, 0);
    }
}
