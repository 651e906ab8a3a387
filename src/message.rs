use serde::{Deserialize, Serialize};

/// A message in a conversation, containing a role and text content.
///
/// This is both the wire shape of the chat endpoint's request body and the
/// shape forwarded to the completion service.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender (e.g., "user", "assistant", "system").
    pub role: String,
    /// The text content of the message.
    pub content: String,
}

impl Message {
    /// User input message role.
    pub const USER: &'static str = "user";
    /// AI assistant response message role.
    pub const ASSISTANT: &'static str = "assistant";
    /// System prompt or instruction message role.
    pub const SYSTEM: &'static str = "system";

    /// Creates a new message with the specified role and content.
    #[must_use]
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: &str) -> Self {
        Self::new(Self::USER, content)
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: &str) -> Self {
        Self::new(Self::ASSISTANT, content)
    }

    /// Creates a system message.
    #[must_use]
    pub fn system(content: &str) -> Self {
        Self::new(Self::SYSTEM, content)
    }

    /// Returns true if this message has the specified role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convenience_constructors_set_roles() {
        assert_eq!(Message::user("Hello").role, Message::USER);
        assert_eq!(Message::assistant("Hi there!").role, Message::ASSISTANT);
        assert_eq!(Message::system("You are helpful").role, Message::SYSTEM);

        let custom = Message::new("function", "Result: 42");
        assert_eq!(custom.role, "function");
        assert_eq!(custom.content, "Result: 42");
    }

    #[test]
    fn serializes_to_role_content_pairs() {
        let original = Message::user("Test message");
        let json = serde_json::to_string(&original).expect("serialization failed");
        assert_eq!(json, r#"{"role":"user","content":"Test message"}"#);

        let parsed: Message = serde_json::from_str(&json).expect("deserialization failed");
        assert_eq!(parsed, original);
        assert!(parsed.has_role(Message::USER));
    }
}
