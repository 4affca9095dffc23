//! A local fake model for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use deep_research_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl From<&PresetFailure> for Error {
    fn from(failure: &PresetFailure) -> Self {
        Self {
            message: failure.message.clone(),
            kind: failure.kind,
        }
    }
}

pub struct TestModelResponse {
    events: Vec<PresetEvent>,
    failure: Option<PresetFailure>,
    event_idx: usize,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };

        if let Some(sleep) = &mut this.sleep {
            let sleep = sleep.as_mut();
            ready!(sleep.poll(cx));
            this.sleep = None;

            if this.event_idx < this.events.len() {
                let event = match &this.events[this.event_idx] {
                    PresetEvent::MessageDelta(msg) => {
                        ModelResponseEvent::MessageDelta(msg.clone())
                    }
                    PresetEvent::Grounding(metadata) => {
                        ModelResponseEvent::Grounding(metadata.clone())
                    }
                };
                this.event_idx += 1;
                return Poll::Ready(Ok(Some(event)));
            } else if let Some(failure) = this.failure.take() {
                this.event_idx += 1;
                return Poll::Ready(Err(Error::from(&failure)));
            } else if this.event_idx == this.events.len() {
                this.event_idx += 1;
                return Poll::Ready(Ok(Some(ModelResponseEvent::Completed(
                    ModelFinishReason::Stop,
                ))));
            } else {
                // In case this method is called after completion.
                return Poll::Ready(Ok(None));
            }
        }
        this.sleep = Some(Box::pin(sleep(this.delay)));
        Pin::new(this).poll_next_event(cx)
    }
}

#[derive(Clone, Debug)]
enum ScriptStep {
    Respond(PresetResponse),
    Fail(PresetFailure),
}

#[derive(Default)]
struct State {
    script: VecDeque<ScriptStep>,
    requests: Vec<ModelRequest>,
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how the
/// model should answer each request, in order. Every request consumes one
/// step; if there are no steps left, an error will be returned.
///
/// Clones share the same script and request log, so a test can keep one
/// handle and hand the other to the code under test.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    state: Arc<Mutex<State>>,
    delay: Option<Duration>,
}

impl TestModelProvider {
    /// Queues a successful response.
    #[inline]
    pub fn add_response(&self, preset: PresetResponse) {
        self.lock().script.push_back(ScriptStep::Respond(preset));
    }

    /// Queues a failed response.
    #[inline]
    pub fn add_failure(&self, failure: PresetFailure) {
        self.lock().script.push_back(ScriptStep::Fail(failure));
    }

    /// Sets the delay between two streamed events.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A panicking test thread must not hide the log from the others.
        self.state.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl Debug for TestModelProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("TestModelProvider")
            .field("remaining_steps", &state.script.len())
            .field("requests", &state.requests.len())
            .finish()
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let mut state = self.lock();
        state.requests.push(req.clone());
        let delay = self.delay.unwrap_or(Duration::from_millis(1));
        let result = match state.script.pop_front() {
            Some(ScriptStep::Respond(preset)) => Ok(TestModelResponse {
                events: preset.events,
                failure: None,
                event_idx: 0,
                delay,
                sleep: None,
            }),
            Some(ScriptStep::Fail(failure)) if failure.mid_stream => {
                Ok(TestModelResponse {
                    events: vec![PresetEvent::MessageDelta(
                        "partial ".to_owned(),
                    )],
                    failure: Some(failure),
                    event_idx: 0,
                    delay,
                    sleep: None,
                })
            }
            Some(ScriptStep::Fail(failure)) => Err(Error::from(&failure)),
            None => Err(Error {
                message: "no enough steps".to_owned(),
                kind: ErrorKind::Other,
            }),
        };
        ready(result)
    }
}
