//! Blocking reqwest implementation of the sync HTTP client.

use focus_sync::{Header, HttpClient, HttpResponse};
use reqwest::blocking::{Client, RequestBuilder};
use std::time::Duration;

/// Default request timeout.
const TIMEOUT: Duration = Duration::from_secs(15);

/// [`HttpClient`] backed by `reqwest::blocking`.
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    /// Builds a client with the default timeout.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(TIMEOUT)
            .user_agent(concat!("focus/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    fn send(request: RequestBuilder, headers: &[Header]) -> Result<HttpResponse, String> {
        let request = headers
            .iter()
            .fold(request, |req, (name, value)| req.header(name, value));
        let response = request.send().map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let body = response.bytes().map_err(|e| e.to_string())?;
        Ok(HttpResponse::new(status, body.to_vec()))
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str, headers: &[Header]) -> Result<HttpResponse, String> {
        Self::send(self.client.get(url), headers)
    }

    fn post(&self, url: &str, headers: &[Header], body: Vec<u8>) -> Result<HttpResponse, String> {
        Self::send(self.client.post(url).body(body), headers)
    }
}
