use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;

use deep_research_model::{
    ErrorKind, GroundingMetadata, GroundingSource, ModelFinishReason,
    ModelProvider, ModelProviderError, ModelRequest, ModelResponse,
    ModelResponseEvent,
};
use tracing::Instrument;

use crate::error::GenerationError;

type GenerateResult = Result<GenerationResult, GenerationError>;
type BoxedGenerateFuture = Pin<Box<dyn Future<Output = GenerateResult> + Send>>;
#[rustfmt::skip]
type HandlerFn = Arc<
    dyn Fn(ModelRequest, Box<dyn Fn(String) + Send + 'static>)
        -> BoxedGenerateFuture + Send + Sync
>;

/// A wrapper around a model provider that drives a response to completion
/// and provides a type-erased interface for the other modules.
///
/// Each call is exactly one request. Failures are handed back as is, there
/// is no retry.
#[derive(Clone)]
pub struct GenerationClient {
    handler_fn: HandlerFn,
}

impl GenerationClient {
    /// Creates a client for the given provider.
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `GenerationClient` doesn't
        // have a generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req, on_delta| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("got a request: {:?}", req);
                    let resp_or_err = fut.await;
                    handle_response::<P>(resp_or_err, on_delta).await
                }
                .instrument(trace_span!("generation client req")),
            )
        });
        Self { handler_fn }
    }

    /// Sends `req` and waits for the whole response.
    ///
    /// `on_delta` is called with every piece of text as it arrives.
    #[inline]
    pub async fn generate(
        &self,
        req: ModelRequest,
        on_delta: impl Fn(String) + Send + 'static,
    ) -> Result<GenerationResult, GenerationError> {
        (self.handler_fn)(req, Box::new(on_delta)).await
    }
}

/// A completely received response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerationResult {
    /// The markdown text of the response.
    pub text: String,
    /// The search entry point markup, embedded verbatim when shown.
    pub grounding_widget_html: Option<String>,
    /// Web pages the response was grounded on.
    pub sources: Vec<GroundingSource>,
    /// Search queries the model issued.
    pub search_queries: Vec<String>,
    /// The reason the model finished generating.
    pub finish_reason: Option<ModelFinishReason>,
}

impl GenerationResult {
    /// Creates a result holding only text.
    #[inline]
    pub fn with_text<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Returns the widget markup if there is any worth embedding.
    #[inline]
    pub fn widget_html(&self) -> Option<&str> {
        self.grounding_widget_html
            .as_deref()
            .filter(|html| !html.trim().is_empty())
    }
}

async fn handle_response<P: ModelProvider + 'static>(
    resp_or_err: Result<P::Response, P::Error>,
    on_delta: Box<dyn Fn(String) + Send + 'static>,
) -> GenerateResult {
    let resp = match resp_or_err {
        Ok(resp) => resp,
        Err(err) => {
            error!("got an error: {err:?}");
            return Err(GenerationError::new(err.kind(), err.to_string()));
        }
    };

    let mut text = String::new();
    let mut grounding: Option<GroundingMetadata> = None;
    let mut finish_reason = None;

    trace!("start receiving events");

    let mut pinned_resp = pin!(resp);
    loop {
        let event_or_err =
            poll_fn(|cx| pinned_resp.as_mut().poll_next_event(cx)).await;
        let event = match event_or_err {
            Ok(event) => event,
            Err(err) => {
                error!("got an error: {err:?}");
                return Err(GenerationError::new(err.kind(), err.to_string()));
            }
        };

        let Some(event) = event else {
            break;
        };
        trace!("got an event: {event:?}");

        match event {
            ModelResponseEvent::MessageDelta(delta) => {
                text.push_str(&delta);
                on_delta(delta);
            }
            // A blank chunk would wipe the widget of an earlier one.
            ModelResponseEvent::Grounding(metadata) if metadata.is_empty() => {}
            ModelResponseEvent::Grounding(metadata) => match &mut grounding {
                Some(grounding) => grounding.merge(metadata),
                None => grounding = Some(metadata),
            },
            ModelResponseEvent::Completed(reason) => {
                finish_reason = Some(reason);
            }
        }
    }

    trace!("finished a request");

    if text.trim().is_empty() {
        return Err(if finish_reason == Some(ModelFinishReason::Filtered) {
            GenerationError::new(
                ErrorKind::Moderated,
                "the response was filtered",
            )
        } else {
            GenerationError::new(
                ErrorKind::Other,
                "the model returned an empty response",
            )
        });
    }

    let grounding = grounding.unwrap_or_default();
    Ok(GenerationResult {
        text,
        grounding_widget_html: grounding.rendered_content,
        sources: grounding.sources,
        search_queries: grounding.search_queries,
        finish_reason,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use deep_research_test_model::{
        PresetEvent, PresetFailure, PresetResponse, TestModelProvider,
    };

    use super::*;

    #[tokio::test]
    async fn test_generate() {
        let model_provider = TestModelProvider::default();
        model_provider.add_response(
            PresetResponse::with_events([
                PresetEvent::MessageDelta("## 1. ".to_owned()),
                PresetEvent::MessageDelta("Executive Summary".to_owned()),
            ])
            .with_widget("<div class=\"chip\"></div>"),
        );

        let client = GenerationClient::new(model_provider.clone());
        let deltas = Arc::new(Mutex::new(vec![]));
        let result = client
            .generate(ModelRequest::with_content("Hi"), {
                let deltas = Arc::clone(&deltas);
                move |delta| deltas.lock().unwrap().push(delta)
            })
            .await
            .unwrap();

        assert_eq!(result.text, "## 1. Executive Summary");
        assert_eq!(result.widget_html(), Some("<div class=\"chip\"></div>"));
        assert_eq!(result.finish_reason, Some(ModelFinishReason::Stop));
        assert_eq!(deltas.lock().unwrap().len(), 2);
        assert_eq!(model_provider.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_grounding_chunks() {
        let model_provider = TestModelProvider::default();
        model_provider.add_response(PresetResponse::with_events([
            PresetEvent::MessageDelta("Text".to_owned()),
            PresetEvent::Grounding(GroundingMetadata {
                rendered_content: Some("<a class=\"chip\">q</a>".to_owned()),
                search_queries: vec!["ev market".to_owned()],
                ..Default::default()
            }),
            PresetEvent::Grounding(GroundingMetadata {
                rendered_content: Some(String::new()),
                ..Default::default()
            }),
            PresetEvent::Grounding(GroundingMetadata {
                search_queries: vec!["ev share".to_owned()],
                ..Default::default()
            }),
        ]));
        let client = GenerationClient::new(model_provider);
        let result = client
            .generate(ModelRequest::with_content("Hi"), |_| {})
            .await
            .unwrap();
        assert_eq!(result.widget_html(), Some("<a class=\"chip\">q</a>"));
        assert_eq!(result.search_queries, ["ev market", "ev share"]);
    }

    #[tokio::test]
    async fn test_without_grounding() {
        let model_provider = TestModelProvider::default();
        model_provider.add_response(PresetResponse::with_text("Plain."));
        let client = GenerationClient::new(model_provider);
        let result = client
            .generate(ModelRequest::with_content("Hi"), |_| {})
            .await
            .unwrap();
        assert_eq!(result.grounding_widget_html, None);
        assert_eq!(result.widget_html(), None);
        assert!(result.sources.is_empty());
    }

    #[tokio::test]
    async fn test_error_handling() {
        let model_provider = TestModelProvider::default();
        model_provider.add_failure(PresetFailure::on_send(
            ErrorKind::Other,
            "error sending request: connection refused",
        ));
        model_provider.add_failure(PresetFailure::mid_stream(
            ErrorKind::RateLimitExceeded,
            "quota exhausted",
        ));
        model_provider.add_response(PresetResponse::with_text("  \n"));
        let client = GenerationClient::new(model_provider.clone());

        let err = client
            .generate(ModelRequest::with_content("Hi"), |_| {})
            .await
            .unwrap_err();
        assert_eq!(err.message(), "error sending request: connection refused");

        let err = client
            .generate(ModelRequest::with_content("Hi"), |_| {})
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);

        let err = client
            .generate(ModelRequest::with_content("Hi"), |_| {})
            .await
            .unwrap_err();
        assert_eq!(err.message(), "the model returned an empty response");

        // Every call is a single attempt.
        assert_eq!(model_provider.requests().len(), 3);
    }

    #[test]
    fn test_blank_widget_is_absent() {
        let result = GenerationResult {
            grounding_widget_html: Some("  ".to_owned()),
            ..GenerationResult::with_text("text")
        };
        assert_eq!(result.widget_html(), None);
    }
}
