use std::fmt;

use parsekit_core::{JsonValue, Tagger};
use serde::Deserialize;

use crate::config::ParseClientBuilder;
use crate::{ParseError, ParseFile, ParseObject, ParseQuery};

pub const DEFAULT_BASE_URL: &str = "https://api.parse.com/1/";

const APPLICATION_ID_HEADER: &str = "X-Parse-Application-Id";
const REST_API_KEY_HEADER: &str = "X-Parse-REST-API-Key";

/// Handle to one Parse application. Cheap to clone; every object, query and
/// file created from it shares the same credentials, transport and tagger.
#[derive(Clone)]
pub struct ParseClient {
    http: reqwest::Client,
    base_url: String,
    application_id: String,
    api_key: String,
    trace: bool,
    tagger: Tagger,
}

impl fmt::Debug for ParseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseClient")
            .field("base_url", &self.base_url)
            .field("application_id", &self.application_id)
            .field("api_key", &"<redacted>")
            .field("trace", &self.trace)
            .field("tagger", &self.tagger)
            .finish()
    }
}

impl ParseClient {
    pub fn builder() -> ParseClientBuilder {
        ParseClientBuilder::new()
    }

    pub(crate) fn new(
        http: reqwest::Client,
        base_url: String,
        application_id: String,
        api_key: String,
        trace: bool,
        tagger: Tagger,
    ) -> Self {
        Self {
            http,
            base_url,
            application_id,
            api_key,
            trace,
            tagger,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    pub fn trace(&self) -> bool {
        self.trace
    }

    pub fn tagger(&self) -> &Tagger {
        &self.tagger
    }

    pub fn object(&self, class_name: impl Into<String>) -> ParseObject {
        ParseObject::new(self.clone(), class_name)
    }

    pub fn query(&self, class_name: impl Into<String>) -> ParseQuery {
        ParseQuery::new(self.clone(), class_name)
    }

    pub fn file(&self) -> ParseFile {
        ParseFile::new(self.clone())
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request_builder(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header(APPLICATION_ID_HEADER, &self.application_id)
            .header(REST_API_KEY_HEADER, &self.api_key)
    }

    /// GET `path`, with `query` (already percent-encoded) appended when non-empty.
    pub(crate) async fn get_json(
        &self,
        path: &str,
        query: &str,
        expected_status: u16,
    ) -> Result<JsonValue, ParseError> {
        let mut url = self.endpoint(path);
        if !query.is_empty() {
            url.push('?');
            url.push_str(query);
        }
        if self.trace {
            tracing::debug!(method = "GET", path, query, "parse request");
        }

        let request = self.request_builder(reqwest::Method::GET, url);
        self.expect_json(request, expected_status).await
    }

    /// POST or PUT a JSON body.
    pub(crate) async fn send_json(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &JsonValue,
        expected_status: u16,
    ) -> Result<JsonValue, ParseError> {
        let buffer = serde_json::to_vec(body)?;
        if self.trace {
            tracing::debug!(
                method = %method,
                path,
                body = %String::from_utf8_lossy(&buffer),
                "parse request"
            );
        }

        let request = self
            .request_builder(method, self.endpoint(path))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(buffer);
        self.expect_json(request, expected_status).await
    }

    pub(crate) async fn delete(
        &self,
        path: &str,
        expected_status: u16,
    ) -> Result<JsonValue, ParseError> {
        if self.trace {
            tracing::debug!(method = "DELETE", path, "parse request");
        }

        let request = self.request_builder(reqwest::Method::DELETE, self.endpoint(path));
        self.expect_json(request, expected_status).await
    }

    pub(crate) async fn post_bytes(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
        expected_status: u16,
    ) -> Result<JsonValue, ParseError> {
        if self.trace {
            tracing::debug!(
                method = "POST",
                path,
                content_type,
                len = bytes.len(),
                "parse upload"
            );
        }

        let request = self
            .request_builder(reqwest::Method::POST, self.endpoint(path))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        self.expect_json(request, expected_status).await
    }

    pub(crate) async fn get_bytes(
        &self,
        path: &str,
        expected_status: u16,
    ) -> Result<Vec<u8>, ParseError> {
        if self.trace {
            tracing::debug!(method = "GET", path, "parse download");
        }

        let response = self
            .request_builder(reqwest::Method::GET, self.endpoint(path))
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        if self.trace {
            tracing::debug!(status, len = body.len(), "parse reply");
        }

        if status != expected_status {
            return Err(api_error(status, &String::from_utf8_lossy(&body)));
        }
        Ok(body.to_vec())
    }

    async fn expect_json(
        &self,
        request: reqwest::RequestBuilder,
        expected_status: u16,
    ) -> Result<JsonValue, ParseError> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        if self.trace {
            tracing::debug!(status, body = %body, "parse reply");
        }

        if status != expected_status {
            return Err(api_error(status, &body));
        }

        if body.trim().is_empty() {
            return Ok(JsonValue::Null);
        }

        serde_json::from_str(&body)
            .map_err(|err| ParseError::Json(format!("failed to decode parse response body: {err}")))
    }
}

#[derive(Debug, Deserialize)]
struct ParseErrorEnvelope {
    #[serde(default)]
    code: i64,
    error: String,
}

fn api_error(status: u16, body: &str) -> ParseError {
    let trimmed = body.trim();
    match serde_json::from_str::<ParseErrorEnvelope>(trimmed) {
        Ok(envelope) => ParseError::Api {
            status,
            code: envelope.code,
            message: envelope.error,
        },
        Err(_) => ParseError::Api {
            status,
            code: 0,
            message: if trimmed.is_empty() {
                "unknown parse error".to_string()
            } else {
                trimmed.to_string()
            },
        },
    }
}
