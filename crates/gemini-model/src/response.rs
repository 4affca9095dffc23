use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use deep_research_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
};
use pin_project_lite::pin_project;

use crate::Error;
use crate::io::Sse;
use crate::proto::{self, GenerateContentChunk};

struct PartialState {
    sse: Sse,
    // Events decoded from a chunk but not yet handed out. One chunk may
    // carry a text delta, grounding metadata and a finish reason at once.
    pending_events: VecDeque<ModelResponseEvent>,
    received_text: bool,
    completed: bool,
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, PartialState), Error>;

pin_project! {
    pub struct GeminiResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
    }
}

impl GeminiResponse {
    #[inline]
    pub fn from_sse(sse: Sse) -> Self {
        let partial_state = PartialState {
            sse,
            pending_events: Default::default(),
            received_text: false,
            completed: false,
        };
        let next_event_fut = async move { next_event(partial_state).await };
        Self {
            next_event_fut: Some(Box::pin(next_event_fut)),
        }
    }
}

impl ModelResponse for GeminiResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        let (event, partial_state) =
            match ready!(next_event_fut.as_mut().poll(cx)) {
                Ok((Some(event), partial_state)) => (event, partial_state),
                Ok((None, _)) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Ok(None));
                }
                Err(err) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Err(err));
                }
            };

        // The stream may still have more data to pull, create a new future for
        // the next event.
        let next_event_fut = async move { next_event(partial_state).await };
        *this.next_event_fut = Some(Box::pin(next_event_fut));

        Poll::Ready(Ok(Some(event)))
    }
}

async fn next_event(
    mut partial_state: PartialState,
) -> Result<(Option<ModelResponseEvent>, PartialState), Error> {
    loop {
        if let Some(event) = partial_state.pending_events.pop_front() {
            return Ok((Some(event), partial_state));
        }

        let sse_event = match partial_state.sse.next_event().await {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(err) => {
                return Err(Error::new(err.to_string(), ErrorKind::Other));
            }
        };
        trace!("got sse event: {sse_event}");

        let chunk = serde_json::from_str::<GenerateContentChunk>(&sse_event)
            .map_err(|err| {
                Error::new(format!("malformed chunk: {err}"), ErrorKind::Other)
            })?;
        decode_chunk(chunk, &mut partial_state)?;
    }

    if !partial_state.received_text {
        return Err(Error::new(
            "the model returned no text",
            ErrorKind::Other,
        ));
    }
    if !partial_state.completed {
        debug!("stream ended without a finish reason");
        partial_state.completed = true;
        let event = ModelResponseEvent::Completed(ModelFinishReason::Other);
        return Ok((Some(event), partial_state));
    }
    Ok((None, partial_state))
}

fn decode_chunk(
    mut chunk: GenerateContentChunk,
    partial_state: &mut PartialState,
) -> Result<(), Error> {
    if partial_state.completed {
        trace!("skipping a chunk after the finish reason");
        return Ok(());
    }
    if let Some(reason) = chunk
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        return Err(Error::new(
            format!("the prompt was blocked: {reason}"),
            ErrorKind::Moderated,
        ));
    }

    if chunk.candidates.is_empty() {
        return Ok(());
    }
    let candidate = chunk.candidates.swap_remove(0);

    // The order of events are important. Always emit message delta first,
    // then grounding metadata, and finally the finish reason if any.
    if let Some(content) = &candidate.content {
        let text = content.text();
        if !text.is_empty() {
            partial_state.received_text = true;
            partial_state
                .pending_events
                .push_back(ModelResponseEvent::MessageDelta(text));
        }
    }
    if let Some(metadata) = candidate.grounding_metadata {
        partial_state
            .pending_events
            .push_back(ModelResponseEvent::Grounding(metadata.into()));
    }
    if let Some(reason) = candidate.finish_reason {
        partial_state.completed = true;
        partial_state
            .pending_events
            .push_back(ModelResponseEvent::Completed(proto::finish_reason(
                &reason,
            )));
    }
    Ok(())
}
