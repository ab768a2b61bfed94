//! Client for the remote renderer's three-call exchange.
//!
//! One render is at most three sequential HTTP calls: the description is
//! POSTed to `{base}/form` and the renderer answers with a redirect whose last
//! path segment is the artifact identifier; `{base}/txt/{id}` is probed for a
//! syntax diagnostic (status 400 means the renderer found one); and unless the
//! caller asked for the plaintext rendering itself, `{base}/{format}/{id}`
//! yields the final artifact. The identifier convention is renderer-specific
//! and confined to this module.

mod diagnostic;

use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, StatusCode, redirect::Policy};
use tracing::debug;
use url::Url;

use crate::domain::{diagram::DiagramFormat, error::RenderError};

/// Stateless client bound to one renderer endpoint.
///
/// Cheap to clone; all renders share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct RendererClient {
    http: Client,
    base: Url,
}

struct Fetched {
    status: StatusCode,
    body: Bytes,
}

impl RendererClient {
    /// Build a client for the renderer at `address`.
    ///
    /// The address must be an absolute http(s) URL; a malformed address fails
    /// here rather than on the first render. Every outbound call is bounded by
    /// `timeout`.
    pub fn new(address: &str, timeout: Duration) -> Result<Self, RenderError> {
        let mut base = Url::parse(address)
            .map_err(|err| RenderError::invalid_address(address, err.to_string()))?;

        if !matches!(base.scheme(), "http" | "https") {
            return Err(RenderError::invalid_address(
                address,
                format!("unsupported scheme `{}`", base.scheme()),
            ));
        }

        // Relative joins below need the base path to end in a slash.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = Client::builder()
            .timeout(timeout)
            .redirect(Policy::limited(10))
            .user_agent(concat!("plantbridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| RenderError::internal(format!("failed to build HTTP client: {err}")))?;

        Ok(Self { http, base })
    }

    /// Render `description` in the requested format.
    ///
    /// Returns the artifact bytes on success. A renderer-reported problem in
    /// the description surfaces as [`RenderError::Syntax`]; everything else is
    /// an operational failure.
    pub async fn render(
        &self,
        description: &str,
        format: DiagramFormat,
    ) -> Result<Bytes, RenderError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(RenderError::EmptyDescription);
        }

        let artifact_id = self.submit(description).await?;
        debug!(
            target = "plantbridge::renderer",
            artifact_id, %format, "diagram submitted"
        );

        let probe = self.fetch(DiagramFormat::Txt, &artifact_id).await?;
        if probe.status == StatusCode::BAD_REQUEST {
            let body = String::from_utf8_lossy(&probe.body);
            let detail = diagnostic::parse(&body);
            debug!(
                target = "plantbridge::renderer",
                artifact_id,
                recognized = detail.is_some(),
                "renderer reported a syntax problem"
            );
            return Err(RenderError::Syntax { detail });
        }

        // The plaintext probe already is the artifact for TXT renders.
        if format == DiagramFormat::Txt {
            return Ok(probe.body);
        }

        let artifact = self.fetch(format, &artifact_id).await?;
        Ok(artifact.body)
    }

    /// Submit the description and extract the artifact identifier from the
    /// redirected submission URL.
    async fn submit(&self, description: &str) -> Result<String, RenderError> {
        let url = self.endpoint("form")?;
        let response = self
            .http
            .post(url)
            .form(&[("text", description)])
            .send()
            .await
            .map_err(|err| RenderError::unavailable(format!("submission failed: {err}")))?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::BAD_REQUEST {
            return Err(RenderError::unavailable(format!(
                "submission returned status {status}"
            )));
        }

        let final_url = response.url().clone();
        // Consume the redirect target's body so the connection can be reused.
        let _ = response.bytes().await;

        let artifact_id = final_url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default()
            .to_string();
        if artifact_id.is_empty() {
            return Err(RenderError::internal(format!(
                "renderer redirect `{final_url}` carries no artifact identifier"
            )));
        }

        Ok(artifact_id)
    }

    /// Fetch one rendering of a previously submitted diagram.
    ///
    /// Status 400 is a renderer-reported problem, not a failure of the fetch;
    /// the body is returned either way for the caller to interpret.
    async fn fetch(&self, format: DiagramFormat, artifact_id: &str) -> Result<Fetched, RenderError> {
        let url = self.endpoint(&format!("{}/{artifact_id}", format.as_path_segment()))?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| RenderError::unavailable(format!("{format} fetch failed: {err}")))?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::BAD_REQUEST {
            return Err(RenderError::unavailable(format!(
                "{format} fetch returned status {status}"
            )));
        }

        let body = response.bytes().await.map_err(|err| {
            RenderError::internal(format!("failed to read {format} response body: {err}"))
        })?;

        Ok(Fetched { status, body })
    }

    fn endpoint(&self, path: &str) -> Result<Url, RenderError> {
        self.base
            .join(path)
            .map_err(|err| RenderError::internal(format!("failed to build URL for `{path}`: {err}")))
    }
}
