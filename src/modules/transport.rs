use std::time::Duration;

use log::trace;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;

use crate::modules::api::{ApiRequest, Method};
use crate::modules::error::{AgentError, Result};

/// Moves one request to the remote world and back.
pub trait Transport {
    fn send(&mut self, request: &ApiRequest) -> Result<Value>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    token: String,
    http: Client,
}

impl HttpTransport {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url.into();
        let token = token.into();
        if token.trim().is_empty() {
            return Err(AgentError::Config(
                "missing API token; set --token, HUNTER_TOKEN or .hunter/.key".into(),
            ));
        }
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            token,
            http,
        })
    }

    fn url(&self, request: &ApiRequest) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            request.endpoint.path()
        )
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let value = format!("Token {}", self.token);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&value)
                .map_err(|e| AgentError::Config(format!("invalid token: {}", e)))?,
        );
        Ok(headers)
    }
}

impl Transport for HttpTransport {
    fn send(&mut self, request: &ApiRequest) -> Result<Value> {
        let url = self.url(request);
        let builder = match request.endpoint.method() {
            Method::Get => self.http.get(&url),
            Method::Post => self.http.post(&url),
        };
        let builder = builder.headers(self.headers()?);
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let resp = builder.send()?;
        let status = resp.status();
        let raw_body = resp.text()?;
        trace!("{} {} -> {} {}", request.endpoint, url, status, raw_body);

        if !status.is_success() {
            return Err(AgentError::Status {
                status: status.as_u16(),
                body: raw_body,
            });
        }

        Ok(serde_json::from_str(&raw_body)?)
    }
}
