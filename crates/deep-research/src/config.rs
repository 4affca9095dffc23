//! Where the credential and provider overrides come from.
//!
//! Values are looked up in the process environment first, then in the
//! `.env` file (which never overrides variables already set), and finally
//! in a TOML secrets file.

use std::env;
use std::fmt::{self, Debug, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

use deep_research_core::error::ConfigurationError;
use deep_research_gemini_model::{GeminiConfig, GeminiConfigBuilder};
use serde::Deserialize;

/// The variable holding the API key.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
/// The variable overriding the model.
pub const MODEL_VAR: &str = "GEMINI_MODEL";
/// The variable overriding the API root.
pub const BASE_URL_VAR: &str = "GEMINI_BASE_URL";
/// The secrets file read when none is given explicitly.
pub const DEFAULT_SECRETS_PATH: &str = ".streamlit/secrets.toml";

/// Files to read settings from, besides the environment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigSources {
    /// An env file to load instead of `./.env`.
    pub env_file: Option<PathBuf>,
    /// A TOML secrets file to read instead of the default one.
    pub secrets_file: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
struct Secrets {
    #[serde(rename = "GEMINI_API_KEY")]
    api_key: Option<String>,
    #[serde(rename = "GEMINI_MODEL")]
    model: Option<String>,
    #[serde(rename = "GEMINI_BASE_URL")]
    base_url: Option<String>,
}

/// Resolved settings of a run.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    api_key: String,
    model: Option<String>,
    base_url: Option<String>,
}

impl Settings {
    /// Loads the settings, failing if no API key can be found.
    pub fn load(sources: &ConfigSources) -> Result<Self, ConfigurationError> {
        load_env_file(sources.env_file.as_deref())?;

        let secrets = match &sources.secrets_file {
            Some(path) => Some(read_secrets(path)?),
            None => {
                let path = Path::new(DEFAULT_SECRETS_PATH);
                if path.is_file() {
                    Some(read_secrets(path)?)
                } else {
                    None
                }
            }
        };

        resolve(|name| env::var(name).ok(), secrets.as_ref())
    }

    /// Overrides the model.
    #[inline]
    pub fn with_model(mut self, model: Option<String>) -> Self {
        if model.is_some() {
            self.model = model;
        }
        self
    }

    /// Overrides the API root.
    #[inline]
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if base_url.is_some() {
            self.base_url = base_url;
        }
        self
    }

    /// Builds the provider configuration.
    pub fn provider_config(&self) -> GeminiConfig {
        let mut builder = GeminiConfigBuilder::with_api_key(&self.api_key);
        if let Some(model) = &self.model {
            builder = builder.with_model(model);
        }
        if let Some(base_url) = &self.base_url {
            builder = builder.with_base_url(base_url);
        }
        builder.build()
    }
}

impl Debug for Settings {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn load_env_file(path: Option<&Path>) -> Result<(), ConfigurationError> {
    let result = match path {
        Some(path) => dotenvy::from_path(path).map(|_| path.to_owned()),
        None => dotenvy::dotenv(),
    };
    match result {
        Ok(path) => {
            debug!("loaded environment from {}", path.display());
            Ok(())
        }
        // A missing `./.env` is fine, the variables may be set already.
        Err(err) if path.is_none() && err.not_found() => Ok(()),
        Err(err) => Err(ConfigurationError::Unreadable {
            path: path.map_or_else(|| PathBuf::from(".env"), Path::to_owned),
            reason: err.to_string(),
        }),
    }
}

fn read_secrets(path: &Path) -> Result<Secrets, ConfigurationError> {
    let unreadable = |reason: String| ConfigurationError::Unreadable {
        path: path.to_owned(),
        reason,
    };
    let content =
        fs::read_to_string(path).map_err(|err| unreadable(err.to_string()))?;
    parse_secrets(&content).map_err(unreadable)
}

fn parse_secrets(content: &str) -> Result<Secrets, String> {
    toml::from_str(content).map_err(|err| err.to_string())
}

fn resolve(
    lookup: impl Fn(&str) -> Option<String>,
    secrets: Option<&Secrets>,
) -> Result<Settings, ConfigurationError> {
    let secrets = secrets.cloned().unwrap_or_default();
    let pick = |name: &str, secret: Option<String>| {
        non_empty(lookup(name)).or_else(|| non_empty(secret))
    };

    let api_key = pick(API_KEY_VAR, secrets.api_key)
        .ok_or(ConfigurationError::MissingCredential { name: API_KEY_VAR })?;
    Ok(Settings {
        api_key,
        model: pick(MODEL_VAR, secrets.model),
        base_url: pick(BASE_URL_VAR, secrets.base_url),
    })
}

/// Blank values count as unset.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(
        vars: &[(&str, &str)],
    ) -> impl Fn(&str) -> Option<String> + use<> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_missing_credential() {
        let err = resolve(lookup(&[]), None).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::MissingCredential { name: "GEMINI_API_KEY" }
        ));

        let err = resolve(lookup(&[(API_KEY_VAR, "  ")]), None).unwrap_err();
        assert!(err.to_string().contains("Please set GEMINI_API_KEY"));
    }

    #[test]
    fn test_environment_wins() {
        let secrets = parse_secrets(
            "GEMINI_API_KEY = \"from-secrets\"\nGEMINI_MODEL = \"gemini-pro\"\n",
        )
        .unwrap();
        let settings =
            resolve(lookup(&[(API_KEY_VAR, "from-env")]), Some(&secrets))
                .unwrap();
        assert_eq!(settings.api_key, "from-env");
        assert_eq!(settings.model.as_deref(), Some("gemini-pro"));
        assert_eq!(settings.provider_config().model(), "gemini-pro");
    }

    #[test]
    fn test_secrets_fallback() {
        let secrets = parse_secrets("GEMINI_API_KEY = \"abc\"").unwrap();
        let settings = resolve(lookup(&[]), Some(&secrets)).unwrap();
        assert_eq!(settings.api_key, "abc");
        assert!(!format!("{settings:?}").contains("abc"));

        let settings = settings.with_model(Some("custom".to_owned()));
        assert_eq!(settings.provider_config().model(), "custom");
    }

    #[test]
    fn test_invalid_secrets() {
        assert!(parse_secrets("GEMINI_API_KEY = ").is_err());
        assert_eq!(parse_secrets("").unwrap(), Secrets::default());
    }
}
