use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::Full;
use http_test_util::drain::DrainBodyFuture;
use http_test_util::empty_body;
use hyper::header::CONTENT_LENGTH;
use hyper::{Request, StatusCode};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Bytes that may not appear raw in a request target. Everything the search
/// term syntax relies on (`:`, `/`, `?`, `=`) passes through untouched.
const REQUEST_TARGET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'|')
    .add(b'\\')
    .add(b'^');

#[derive(Debug)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

#[derive(Clone)]
pub struct HttpClient {
    client: Client<HttpConnector, Full<Bytes>>,
}

impl HttpClient {
    #[must_use]
    pub fn new() -> Self {
        Self::with_connect_timeout(None)
    }

    #[must_use]
    pub fn with_connect_timeout(timeout: Option<Duration>) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(timeout);
        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self { client }
    }

    /// One GET, no retries. Any status is returned as a response.
    pub async fn get(&self, url: &str) -> Result<HttpResponse> {
        let target = wire_form(url);
        let request = Request::get(target.as_str())
            .body(empty_body())
            .with_context(|| format!("Failed to build request for {target}"))?;
        self.send_recv(request).await
    }

    pub async fn send_recv(&self, request: Request<Full<Bytes>>) -> Result<HttpResponse> {
        let resp = self
            .client
            .request(request)
            .await
            .context("Failed to send request")?;
        let status = resp.status();
        let content_length: usize = resp
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|hv| hv.to_str().ok())
            .and_then(|hv| hv.parse().ok())
            .unwrap_or(1024);
        let body = DrainBodyFuture::with_size_hint(resp.into_body(), content_length)
            .await
            .context("Failed to read response body")?;
        Ok(HttpResponse { status, body })
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Percent-encodes what a request target cannot carry raw, the server
/// decodes it back to the original text.
#[must_use]
pub fn wire_form(url: &str) -> String {
    utf8_percent_encode(url, REQUEST_TARGET).to_string()
}
