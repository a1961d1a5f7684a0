use serde::{Deserialize, Serialize};

/// Who authored a [`Message`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// Text the user typed.
    User,
    /// Text produced for the user by the session.
    Bot,
}

/// One entry of the conversation log.
///
/// Messages are immutable once appended; the log only ever grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who wrote the message.
    pub sender: Sender,

    /// The full text of the message.
    pub text: String,
}

impl Message {
    /// Create a message authored by the user.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    /// Create a message authored by the bot.
    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
        }
    }

    /// Returns true if the user wrote this message.
    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn sender_serializes_lowercase() {
        let json = to_value(Message::bot("hi there")).unwrap();
        assert_eq!(json, json!({"sender": "bot", "text": "hi there"}));
    }

    #[test]
    fn user_constructor() {
        let message = Message::user("hello");
        assert!(message.is_user());
        assert_eq!(message.text, "hello");
    }
}
