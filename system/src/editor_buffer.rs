use crate::traits::DocumentView;

/// Plain in-memory [`DocumentView`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorBuffer {
    text: String,
    replacements: usize,
}

impl EditorBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            replacements: 0,
        }
    }

    /// How many times the buffer was swapped by a remote snapshot.
    pub fn replacements(&self) -> usize {
        self.replacements
    }

    /// A local edit; returns the new full text the widget would report.
    pub fn edit(&mut self, text: impl Into<String>) -> &str {
        self.text = text.into();
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl DocumentView for EditorBuffer {
    fn text(&self) -> &str {
        &self.text
    }

    fn replace_text(&mut self, text: &str) {
        self.text.clear();
        self.text.push_str(text);
        self.replacements += 1;
    }
}
