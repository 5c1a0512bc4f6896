use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use parsekit_core::{TagHook, Tagger};

use crate::client::DEFAULT_BASE_URL;
use crate::{ParseClient, ParseError};

#[derive(Default, Clone)]
pub struct ParseClientBuilder {
    application_id: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    trace: bool,
    hook: Option<Arc<dyn TagHook>>,
}

impl fmt::Debug for ParseClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_some() {
            "<redacted>"
        } else {
            "<none>"
        };

        f.debug_struct("ParseClientBuilder")
            .field("application_id", &self.application_id)
            .field("api_key", &api_key)
            .field("base_url", &self.base_url)
            .field("trace", &self.trace)
            .field("tag_hook", &self.hook.is_some())
            .finish()
    }
}

impl ParseClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn application_id(mut self, value: impl Into<String>) -> Self {
        self.application_id = Some(value.into());
        self
    }

    pub fn api_key(mut self, value: impl Into<String>) -> Self {
        self.api_key = Some(value.into());
        self
    }

    /// Defaults to `https://api.parse.com/1/`.
    pub fn base_url(mut self, value: impl Into<String>) -> Self {
        self.base_url = Some(value.into());
        self
    }

    /// Log request and reply bodies at debug level.
    pub fn trace(mut self, value: bool) -> Self {
        self.trace = value;
        self
    }

    pub fn tag_hook<H: TagHook + 'static>(mut self, hook: H) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    pub fn application_id_from_env(mut self, var_name: &str) -> Self {
        if let Ok(value) = std::env::var(var_name) {
            self.application_id = Some(value);
        }
        self
    }

    pub fn api_key_from_env(mut self, var_name: &str) -> Self {
        if let Ok(value) = std::env::var(var_name) {
            self.api_key = Some(value);
        }
        self
    }

    pub fn build(self) -> Result<ParseClient, ParseError> {
        let application_id = self
            .application_id
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(ParseError::MissingApplicationId)?;
        let api_key = self
            .api_key
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(ParseError::MissingApiKey)?;

        let base_url = self
            .base_url
            .map(|value| value.trim().to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let parsed = reqwest::Url::parse(&base_url)
            .map_err(|err| ParseError::InvalidBaseUrl(format!("{base_url}: {err}")))?;
        if parsed.cannot_be_a_base() {
            return Err(ParseError::InvalidBaseUrl(base_url));
        }

        if parsed.scheme() != "https" && !is_loopback(&parsed) {
            tracing::warn!(
                base_url = %base_url,
                "parse base_url is not https; credentials are sent in clear text"
            );
        }

        let tagger = match self.hook {
            Some(hook) => Tagger::with_shared_hook(hook),
            None => Tagger::new(),
        };

        Ok(ParseClient::new(
            reqwest::Client::new(),
            base_url,
            application_id,
            api_key,
            self.trace,
            tagger,
        ))
    }
}

fn is_loopback(url: &reqwest::Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    host.eq_ignore_ascii_case("localhost")
        || host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .is_ok_and(|addr| addr.is_loopback())
}
