//! View seams the binders draw into, with headless implementations.

use log::info;

use crate::binders::DiceFace;

/// Something that can show a dice face.
pub trait DiceView {
    /// Display `face`.
    fn show(&mut self, face: DiceFace);
}

/// A single-line editable text control.
pub trait TextControl {
    /// Current content.
    fn value(&self) -> String;
    /// Overwrite the content.
    fn set_value(&mut self, text: &str);
}

/// Dice view that remembers what it showed and logs each face.
#[derive(Debug, Default)]
pub struct ConsoleDiceView {
    label: String,
    current: Option<DiceFace>,
    shown: u64,
}

impl ConsoleDiceView {
    /// A view whose log lines are prefixed with `label`.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Last face shown.
    pub fn current(&self) -> Option<DiceFace> {
        self.current
    }

    /// How many times a face was drawn.
    pub fn shown(&self) -> u64 {
        self.shown
    }
}

impl DiceView for ConsoleDiceView {
    fn show(&mut self, face: DiceFace) {
        info!(
            "{}: dice shows {} ({}) in {}",
            self.label,
            face.value,
            face.glyph,
            face.css_color()
        );
        self.current = Some(face);
        self.shown += 1;
    }
}

/// In-memory text box with a caret, standing in for an input element.
///
/// Overwriting the value moves the caret to the end, as browsers do.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TextBuffer {
    content: String,
    caret: usize,
}

impl TextBuffer {
    /// An empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Caret position in characters.
    pub fn caret(&self) -> usize {
        self.caret
    }

    /// Insert `text` at the caret, as if typed.
    pub fn type_str(&mut self, text: &str) {
        let at = self.byte_offset(self.caret);
        self.content.insert_str(at, text);
        self.caret += text.chars().count();
    }

    /// Delete the character before the caret.
    pub fn backspace(&mut self) {
        if self.caret == 0 {
            return;
        }
        let at = self.byte_offset(self.caret - 1);
        self.content.remove(at);
        self.caret -= 1;
    }

    /// Move the caret, clamped to the content.
    pub fn move_caret(&mut self, pos: usize) {
        self.caret = pos.min(self.content.chars().count());
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.content
            .char_indices()
            .nth(chars)
            .map_or(self.content.len(), |(i, _)| i)
    }
}

impl TextControl for TextBuffer {
    fn value(&self) -> String {
        self.content.clone()
    }

    fn set_value(&mut self, text: &str) {
        self.content = text.to_string();
        self.caret = self.content.chars().count();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typing_and_backspace_follow_the_caret() {
        let mut buf = TextBuffer::new();
        buf.type_str("héllo");
        buf.move_caret(1);
        buf.type_str("X");
        assert_eq!(buf.value(), "hXéllo");
        assert_eq!(buf.caret(), 2);
        buf.backspace();
        buf.backspace();
        assert_eq!(buf.value(), "éllo");
        assert_eq!(buf.caret(), 0);
        buf.backspace();
        assert_eq!(buf.value(), "éllo");
    }

    #[test]
    fn set_value_moves_caret_to_end() {
        let mut buf = TextBuffer::new();
        buf.type_str("ab");
        buf.move_caret(0);
        buf.set_value("xyz");
        assert_eq!(buf.caret(), 3);
    }

    #[test]
    fn console_view_remembers_last_face() {
        let mut view = ConsoleDiceView::new("test");
        view.show(DiceFace::for_value(3).unwrap());
        view.show(DiceFace::for_value(5).unwrap());
        assert_eq!(view.current().map(|f| f.value), Some(5));
        assert_eq!(view.shown(), 2);
    }
}
