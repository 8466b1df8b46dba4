use crate::domain::ports::{HttpRequest, HttpResponse, Transport, TransportError};
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const USER_AGENT: &str = concat!("adres-enrich/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
        let mut builder = self.client.get(&request.url).timeout(request.timeout);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        tracing::debug!("GET {} {:?}", request.url, request.query);
        let response = builder.send().await.map_err(describe)?;
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let body = response.text().await.map_err(describe)?;
        tracing::debug!("HTTP {} from {} ({} bytes)", status, request.url, body.len());

        Ok(HttpResponse {
            status,
            body,
            retry_after,
        })
    }
}

fn describe(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::new(format!("timed out: {}", err))
    } else if err.is_connect() {
        TransportError::new(format!("connection failed: {}", err))
    } else {
        TransportError::new(err.to_string())
    }
}
