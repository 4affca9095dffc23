use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::task::{self, Poll, ready};
use std::time::Duration;

use deep_research_model::{
    ErrorKind, GroundingMetadata, ModelFinishReason, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

#[derive(Debug)]
struct FakeModelProviderError(ErrorKind);

impl Display for FakeModelProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for FakeModelProviderError {}

impl ModelProviderError for FakeModelProviderError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

#[derive(Debug)]
struct FakeModelResponse {
    fake_events: VecDeque<ModelResponseEvent>,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl FakeModelResponse {
    fn new(input: &str, grounded: bool) -> Self {
        let mut words: Vec<String> = format!("You said {}", input)
            .split(' ')
            .map(ToString::to_string)
            .collect();
        let last = words.len() - 1;
        for word in &mut words[..last] {
            word.push(' ');
        }
        let mut fake_events: VecDeque<_> =
            words.into_iter().map(ModelResponseEvent::MessageDelta).collect();
        if grounded {
            fake_events.push_back(ModelResponseEvent::Grounding(
                GroundingMetadata {
                    rendered_content: Some("<div>chips</div>".to_owned()),
                    ..Default::default()
                },
            ));
        }
        fake_events
            .push_back(ModelResponseEvent::Completed(ModelFinishReason::Stop));
        Self {
            fake_events,
            sleep: None,
        }
    }
}

impl ModelResponse for FakeModelResponse {
    type Error = FakeModelProviderError;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };
        if let Some(sleep) = &mut this.sleep {
            let sleep = sleep.as_mut();
            ready!(sleep.poll(cx));
            this.sleep = None;
            return Poll::Ready(Ok(this.fake_events.pop_front()));
        }
        this.sleep = Some(Box::pin(sleep(Duration::from_millis(1))));
        Pin::new(this).poll_next_event(cx)
    }
}

struct FakeModelProvider;

impl ModelProvider for FakeModelProvider {
    type Error = FakeModelProviderError;
    type Response = FakeModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let result = if req.content.is_empty() {
            Err(FakeModelProviderError(ErrorKind::Other))
        } else {
            Ok(FakeModelResponse::new(
                &req.content,
                req.system_instruction.is_some(),
            ))
        };
        ready(result)
    }
}

mod tests {
    use std::future::poll_fn;

    use super::*;

    async fn collect(
        mut resp: FakeModelResponse,
    ) -> (String, Option<GroundingMetadata>, Option<ModelFinishReason>) {
        let mut resp_message = String::new();
        let mut grounding = None;
        let mut finish_reason = None;
        loop {
            let resp_fut =
                poll_fn(|cx| Pin::new(&mut resp).poll_next_event(cx));
            match resp_fut.await {
                Ok(Some(event)) => match event {
                    ModelResponseEvent::MessageDelta(delta) => {
                        resp_message.push_str(&delta);
                    }
                    ModelResponseEvent::Grounding(metadata) => {
                        grounding = Some(metadata);
                    }
                    ModelResponseEvent::Completed(reason) => {
                        finish_reason = Some(reason);
                    }
                },
                Ok(None) => break,
                Err(err) => unreachable!("unexpected error: {err:?}"),
            }
        }
        (resp_message, grounding, finish_reason)
    }

    #[tokio::test]
    async fn test_completion() {
        let provider = FakeModelProvider;
        let req = ModelRequest::with_content("Good morning");
        let resp = provider.send_request(&req).await.unwrap();

        let (message, grounding, finish_reason) = collect(resp).await;
        assert_eq!(message, "You said Good morning");
        assert_eq!(grounding, None);
        assert_eq!(finish_reason, Some(ModelFinishReason::Stop));
    }

    #[tokio::test]
    async fn test_grounded_completion() {
        let provider = FakeModelProvider;
        let req = ModelRequest::with_content("Hi")
            .with_system_instruction("You are a research analyst.");
        let resp = provider.send_request(&req).await.unwrap();

        let (message, grounding, _) = collect(resp).await;
        assert_eq!(message, "You said Hi");
        assert_eq!(
            grounding.unwrap().rendered_content.as_deref(),
            Some("<div>chips</div>")
        );
    }

    #[tokio::test]
    async fn test_error() {
        let provider = FakeModelProvider;
        let req = ModelRequest::default();
        let result = provider.send_request(&req).await;
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }

    #[test]
    fn test_event_serialization() {
        let event = ModelResponseEvent::Completed(ModelFinishReason::Length);
        let json = serde_json::to_string(&event).unwrap();
        let back: ModelResponseEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
