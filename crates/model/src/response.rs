use std::pin::Pin;
use std::task::{self, Poll};

use serde::{Deserialize, Serialize};

use crate::grounding::GroundingMetadata;
use crate::provider::ModelProviderError;

/// A streamed response of a grounded generation request.
pub trait ModelResponse: Sized + Send + 'static {
    /// The error type that may be returned by the provider.
    type Error: ModelProviderError;

    /// Attempts to pull out the next event from the response.
    ///
    /// Text arrives as [`ModelResponseEvent::MessageDelta`] in stream
    /// order. Grounding may arrive at any point, usually with the last
    /// chunk. The stream ends with exactly one
    /// [`ModelResponseEvent::Completed`], after which `Ok(None)` is
    /// returned forever.
    ///
    /// An `Err` ends the response; text delivered before it is partial and
    /// should be discarded by the caller.
    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>>;
}

/// The reason why a model response has finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelFinishReason {
    /// The model has finished generating text.
    Stop,
    /// The output token limit was reached.
    Length,
    /// The output was cut by a safety or recitation filter.
    Filtered,
    /// Any other reason reported by the provider.
    Other,
}

/// The event from a model response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelResponseEvent {
    /// The response has been completed.
    Completed(ModelFinishReason),
    /// Received a message delta.
    MessageDelta(String),
    /// Received search grounding information.
    ///
    /// Providers may deliver this more than once; consumers should
    /// merge the chunks with [`GroundingMetadata::merge`].
    Grounding(GroundingMetadata),
}
