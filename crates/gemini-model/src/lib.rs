//! A model provider for the Gemini API with Google Search grounding.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use deep_research_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest,
};
use mime::Mime;
use reqwest::{Client, Response, StatusCode, header};

pub use config::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, GeminiConfig, GeminiConfigBuilder,
};
use io::{Chunks, Sse};
use proto::ApiErrorEnvelope;
use response::GeminiResponse;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Error type for [`GeminiProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Gemini model provider.
///
/// Every request enables the Google Search tool and asks for text-only
/// output.
#[derive(Clone, Debug)]
pub struct GeminiProvider {
    client: Client,
    config: Arc<GeminiConfig>,
}

impl GeminiProvider {
    /// Creates a new `GeminiProvider` with the given configuration.
    #[inline]
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    /// Returns the configuration of this provider.
    #[inline]
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }
}

impl ModelProvider for GeminiProvider {
    type Error = Error;
    type Response = GeminiResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let gemini_req = proto::create_request(req);
        let resp_fut = self
            .client
            .post(self.config.stream_url())
            .header(API_KEY_HEADER, &self.config.api_key)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "text/event-stream")
            .json(&gemini_req)
            .send();

        async move {
            let resp = match resp_fut.await {
                Ok(resp) => resp,
                Err(err) => {
                    return Err(Error::new(format!("{err}"), ErrorKind::Other));
                }
            };
            let resp = check_status(resp).await?;

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let is_valid_content_type = content_type
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| m.subtype().as_str() == "event-stream")
                .unwrap_or(false);
            if !is_valid_content_type {
                return Err(Error::new(
                    format!("Unexpected content type: {content_type:?}"),
                    ErrorKind::Other,
                ));
            }

            // Here we got a successful response.
            let chunks = Chunks::from_response(resp);
            let sse = Sse::new(chunks);
            Ok(GeminiResponse::from_sse(sse))
        }
    }
}

async fn check_status(resp: Response) -> Result<Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let kind = if status == StatusCode::TOO_MANY_REQUESTS {
        ErrorKind::RateLimitExceeded
    } else {
        ErrorKind::Other
    };
    // Prefer the API's own explanation over the bare status line.
    let body = resp.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiErrorEnvelope>(&body) {
        Ok(ApiErrorEnvelope { error }) => describe_api_error(status, &error),
        Err(_) => format!("HTTP status {status}"),
    };
    debug!("request failed with {status}: {body}");
    Err(Error::new(message, kind))
}

fn describe_api_error(status: StatusCode, error: &proto::ApiError) -> String {
    let code = error.code.unwrap_or(status.as_u16());
    match &error.status {
        Some(name) => format!("{code} {name}: {}", error.message),
        None => format!("{code}: {}", error.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_api_error() {
        let envelope: ApiErrorEnvelope = serde_json::from_str(
            r#"{"error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}}"#,
        )
        .unwrap();
        assert_eq!(
            describe_api_error(StatusCode::BAD_REQUEST, &envelope.error),
            "400 INVALID_ARGUMENT: API key not valid."
        );

        let error = proto::ApiError {
            code: None,
            message: "Slow down.".to_owned(),
            status: None,
        };
        assert_eq!(
            describe_api_error(StatusCode::TOO_MANY_REQUESTS, &error),
            "429: Slow down."
        );
    }
}
