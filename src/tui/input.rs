/// Single-line input for typed quiz answers. Cursor arithmetic is in
/// characters; edits land on char boundaries.
pub struct AnswerInput {
    text: String,
    cursor: usize,
}

impl AnswerInput {
    pub fn new() -> Self {
        AnswerInput {
            text: String::new(),
            cursor: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Character column of the cursor, for terminal cursor placement.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Hand over the typed answer and reset for the next question.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    pub fn insert_char(&mut self, ch: char) {
        let idx = Self::char_to_byte_index(&self.text, self.cursor);
        self.text.insert(idx, ch);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let end = Self::char_to_byte_index(&self.text, self.cursor);
        let start = Self::char_to_byte_index(&self.text, self.cursor - 1);
        self.text.drain(start..end);
        self.cursor -= 1;
    }

    pub fn delete(&mut self) {
        if self.cursor >= self.text.chars().count() {
            return;
        }
        let start = Self::char_to_byte_index(&self.text, self.cursor);
        let end = Self::char_to_byte_index(&self.text, self.cursor + 1);
        self.text.drain(start..end);
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.text.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.text.chars().count();
    }

    fn char_to_byte_index(text: &str, column: usize) -> usize {
        text.char_indices()
            .nth(column)
            .map(|(idx, _)| idx)
            .unwrap_or_else(|| text.len())
    }
}

impl Default for AnswerInput {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typing_and_taking_resets_the_line() {
        let mut input = AnswerInput::new();
        for ch in "paris".chars() {
            input.insert_char(ch);
        }
        assert_eq!(input.text(), "paris");

        assert_eq!(input.take(), "paris");
        assert_eq!(input.text(), "");
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn edits_respect_multibyte_characters() {
        let mut input = AnswerInput::new();
        for ch in "東京".chars() {
            input.insert_char(ch);
        }
        input.move_left();
        input.insert_char('大');
        assert_eq!(input.text(), "東大京");

        input.backspace();
        assert_eq!(input.text(), "東京");

        input.move_home();
        input.delete();
        assert_eq!(input.text(), "京");
    }
}
