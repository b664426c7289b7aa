use serde::Serialize;

/// Conversational role as the completion endpoint expects it on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered, append-only log of the conversation so far.
///
/// The endpoint is stateless per call, so the full history is sent as
/// context with every request. Messages are never removed individually;
/// the log is either appended to or cleared wholesale.
#[derive(Debug, Default)]
pub struct History {
    messages: Vec<Message>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Full ordered conversation, oldest first.
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_snapshot() {
        let mut history = History::new();
        history.append(Message::user("hello"));
        history.append(Message::assistant("hi there"));

        let snapshot = history.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0], Message::user("hello"));
        assert_eq!(snapshot.last(), Some(&Message::assistant("hi there")));
    }

    #[test]
    fn append_grows_by_one() {
        let mut history = History::new();
        for i in 0..4 {
            let before = history.len();
            history.append(Message::user(format!("msg {i}")));
            assert_eq!(history.len(), before + 1);
        }
    }

    #[test]
    fn clear_empties_the_log() {
        let mut history = History::new();
        history.append(Message::user("hello"));
        history.clear();
        assert!(history.is_empty());
        assert!(history.snapshot().is_empty());
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_string(&Message::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
        let json = serde_json::to_string(&Message::assistant("yo")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"yo"}"#);
    }
}
