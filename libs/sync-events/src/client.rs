use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};

use crate::{response::IntoResponse, SyncEventsError};

#[derive(Clone, Debug)]
pub struct Client {
    base_url: String,
    http: reqwest::Client,
}

impl Client {
    pub fn new(
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, SyncEventsError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!(
                "activity-feed/",
                env!("CARGO_PKG_VERSION")
            )),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .into_response("failed to build http client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Body of a successful `GET {base_url}/{path}`.
    pub async fn get(&self, path: &str) -> Result<String, SyncEventsError> {
        let response = self
            .http
            .get(format!("{}/{}", self.base_url, path.trim_start_matches('/')))
            .send()
            .await
            .into_response("failed to send")?;

        let status = response.status();

        let text = response.text().await.into_response("failed to get text")?;

        if !status.is_success() {
            return Err(SyncEventsError::FailedStatusCode {
                status_code: status,
                message: text,
            });
        }

        Ok(text)
    }
}
