/// Handle to one assistant bubble, valid until the surface is cleared.
pub type BubbleId = usize;

/// Narrow interface the session uses to talk to the presentation layer.
///
/// The session never touches widgets or layout; it only appends
/// bubbles, rewrites the one it was handed, and toggles the busy
/// indicator. The TUI renders whatever the surface holds.
pub trait Surface {
    fn append_user(&mut self, text: &str);
    /// Adds an assistant bubble showing `placeholder` and returns a
    /// handle for later rewrites.
    fn append_assistant(&mut self, placeholder: &str) -> BubbleId;
    fn update_assistant(&mut self, id: BubbleId, text: &str);
    /// Rewrites the bubble with failure copy, styled as an error.
    fn mark_error(&mut self, id: BubbleId, text: &str);
    fn set_busy(&mut self, busy: bool);
    fn scroll_to_latest(&mut self);
    /// Drops every bubble; existing `BubbleId`s become invalid.
    fn clear(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleKind {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub kind: BubbleKind,
    pub text: String,
    /// Still showing the placeholder, waiting for the first real text.
    pub pending: bool,
    pub error: bool,
}

/// The chat transcript backing the TUI: an ordered list of bubbles
/// plus the busy indicator and a follow-the-bottom scroll hint.
#[derive(Debug, Default)]
pub struct Transcript {
    bubbles: Vec<Bubble>,
    busy: bool,
    follow: bool,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// True when the view should snap to the newest bubble; cleared by
    /// the caller once it has scrolled (or when the user scrolls away).
    pub fn follow_latest(&self) -> bool {
        self.follow
    }

    pub fn set_follow(&mut self, follow: bool) {
        self.follow = follow;
    }
}

impl Surface for Transcript {
    fn append_user(&mut self, text: &str) {
        self.bubbles.push(Bubble {
            kind: BubbleKind::User,
            text: text.to_string(),
            pending: false,
            error: false,
        });
        self.scroll_to_latest();
    }

    fn append_assistant(&mut self, placeholder: &str) -> BubbleId {
        self.bubbles.push(Bubble {
            kind: BubbleKind::Bot,
            text: placeholder.to_string(),
            pending: true,
            error: false,
        });
        self.scroll_to_latest();
        self.bubbles.len() - 1
    }

    fn update_assistant(&mut self, id: BubbleId, text: &str) {
        if let Some(bubble) = self.bubbles.get_mut(id) {
            bubble.text = text.to_string();
            bubble.pending = false;
        }
        self.scroll_to_latest();
    }

    fn mark_error(&mut self, id: BubbleId, text: &str) {
        if let Some(bubble) = self.bubbles.get_mut(id) {
            bubble.text = text.to_string();
            bubble.pending = false;
            bubble.error = true;
        }
        self.scroll_to_latest();
    }

    fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    fn scroll_to_latest(&mut self) {
        self.follow = true;
    }

    fn clear(&mut self) {
        self.bubbles.clear();
        self.busy = false;
        self.follow = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_bubble_is_pending_until_updated() {
        let mut transcript = Transcript::new();
        transcript.append_user("hello");
        let id = transcript.append_assistant("Just a sec...");
        assert!(transcript.bubbles()[id].pending);

        transcript.update_assistant(id, "hi");
        let bubble = &transcript.bubbles()[id];
        assert_eq!(bubble.text, "hi");
        assert!(!bubble.pending);
        assert!(!bubble.error);
    }

    #[test]
    fn mark_error_flags_the_bubble() {
        let mut transcript = Transcript::new();
        let id = transcript.append_assistant("Just a sec...");
        transcript.mark_error(id, "Response generation stopped.");
        let bubble = &transcript.bubbles()[id];
        assert!(bubble.error);
        assert_eq!(bubble.text, "Response generation stopped.");
    }

    #[test]
    fn clear_invalidates_everything() {
        let mut transcript = Transcript::new();
        transcript.append_user("hello");
        transcript.set_busy(true);
        transcript.clear();
        assert!(transcript.bubbles().is_empty());
        assert!(!transcript.is_busy());
    }
}
