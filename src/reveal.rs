/// How often the event loop ticks, which is also how often one more
/// word of a pending reply becomes visible.
pub const REVEAL_INTERVAL_MS: u64 = 40;

/// Replays a finished response word-by-word to simulate live generation.
///
/// The job is driven externally: each `advance()` call reveals one more
/// whitespace-separated word and returns the partial text shown so far,
/// or `None` once everything is out. A job cannot be rewound or reused;
/// cancelling mid-reveal is just dropping it, which leaves whatever was
/// last shown on screen.
#[derive(Debug)]
pub struct RevealJob {
    text: String,
    words: Vec<String>,
    cursor: usize,
    shown: String,
}

impl RevealJob {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            words: text.split_whitespace().map(str::to_string).collect(),
            cursor: 0,
            shown: String::new(),
        }
    }

    /// Reveals the next word. Returns the partial text to display, or
    /// `None` when every word has already been emitted.
    pub fn advance(&mut self) -> Option<String> {
        let word = self.words.get(self.cursor)?;
        if self.cursor > 0 {
            self.shown.push(' ');
        }
        self.shown.push_str(word);
        self.cursor += 1;
        Some(self.shown.clone())
    }

    pub fn is_done(&self) -> bool {
        self.cursor >= self.words.len()
    }

    /// The complete response this job is revealing.
    pub fn text(&self) -> &str {
        &self.text
    }
}
