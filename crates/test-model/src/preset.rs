use deep_research_model::{ErrorKind, GroundingMetadata};
use serde::{Deserialize, Serialize};

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "message_delta")]
    MessageDelta(String),
    #[serde(rename = "grounding")]
    Grounding(GroundingMetadata),
}

/// The preset response for one request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
        }
    }

    /// Creates a `PresetResponse` that streams `text` in one delta.
    #[inline]
    pub fn with_text<S: Into<String>>(text: S) -> Self {
        Self::with_events([PresetEvent::MessageDelta(text.into())])
    }

    /// Appends a grounding event carrying the given widget markup.
    #[inline]
    pub fn with_widget<S: Into<String>>(mut self, html: S) -> Self {
        self.events.push(PresetEvent::Grounding(GroundingMetadata {
            rendered_content: Some(html.into()),
            ..Default::default()
        }));
        self
    }
}

/// A preset failure for one request.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PresetFailure {
    /// The kind reported by the error.
    pub kind: ErrorKind,
    /// The message of the error.
    pub message: String,
    /// Whether the failure happens after the response has started
    /// streaming, instead of when sending the request.
    pub mid_stream: bool,
}

impl PresetFailure {
    /// A failure raised while sending the request, like a network error.
    #[inline]
    pub fn on_send<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
            mid_stream: false,
        }
    }

    /// A failure raised after the response started streaming.
    #[inline]
    pub fn mid_stream<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
            mid_stream: true,
        }
    }
}
