use std::fmt::Debug;

/// The model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// The API root used when none is configured.
pub const DEFAULT_BASE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta";

/// Builder for [`GeminiConfig`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct GeminiConfigBuilder {
    api_key: String,
    model: Option<String>,
    base_url: Option<String>,
}

impl GeminiConfigBuilder {
    /// Creates a builder with the given API key.
    #[inline]
    pub fn with_api_key<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: api_key.into(),
            model: None,
            base_url: None,
        }
    }

    /// Sets the model to use.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets a custom base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> GeminiConfig {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        GeminiConfig {
            api_key: self.api_key,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }
}

impl Debug for GeminiConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfigBuilder")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Configuration for the Gemini provider.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct GeminiConfig {
    pub(crate) api_key: String,
    pub(crate) model: String,
    pub(crate) base_url: String,
}

impl GeminiConfig {
    /// Returns the model identifier.
    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the streaming endpoint for the configured model.
    pub(crate) fn stream_url(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }
}

impl Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeminiConfigBuilder::with_api_key("secret").build();
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(
            config.stream_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/\
             gemini-2.0-flash:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = GeminiConfigBuilder::with_api_key("secret")
            .with_base_url("http://localhost:8080/")
            .with_model("custom")
            .build();
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert_eq!(
            config.stream_url(),
            "http://localhost:8080/models/custom:streamGenerateContent?alt=sse"
        );
    }
}
