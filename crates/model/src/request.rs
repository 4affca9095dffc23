/// A request to be sent to the model provider.
///
/// Every request is a single user content string, optionally steered by a
/// system instruction. Conversation memory, if any, is already folded into
/// `content` by the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ModelRequest {
    /// The system instruction.
    pub system_instruction: Option<String>,
    /// The user content.
    pub content: String,
}

impl ModelRequest {
    /// Creates a request with only user content.
    #[inline]
    pub fn with_content<S: Into<String>>(content: S) -> Self {
        Self {
            system_instruction: None,
            content: content.into(),
        }
    }

    /// Sets the system instruction.
    #[inline]
    pub fn with_system_instruction<S: Into<String>>(
        mut self,
        instruction: S,
    ) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }
}
