//! HTTP access to the DWD endpoints

use std::time::Duration;

use reqwest::Client;

use crate::{IngestError, IngestResult};

/// Raw response: status code plus the body as text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body of a successful response, an error for any other status
    pub fn into_success_body(self, url: &str) -> IngestResult<String> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(IngestError::Status {
                status: self.status,
                url: url.to_string(),
            })
        }
    }
}

/// Single GET per call; no retries
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> IngestResult<FetchResponse>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> IngestResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> IngestResult<FetchResponse> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(FetchResponse { status, body })
    }
}

/// `{base}?stationIds={id}`
pub fn forecast_url(base_url: &str, station_id: &str) -> String {
    format!("{}?stationIds={}", base_url, station_id)
}

/// `{base}{identifier}.csv`
pub fn observation_url(base_url: &str, identifier: &str) -> String {
    format!("{}{}.csv", base_url, identifier)
}
