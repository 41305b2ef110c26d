use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use roundctl_core::clock_sync::parse_server_time;
use roundctl_core::constants::{MAX_DIGIT, MSG_COMMIT_FAILED, MSG_TIME_FETCH_FAILED};
use roundctl_core::error::RoundCtlError;
use roundctl_core::traits::transport::GameTransport;

const PATH_TIME: &str = "/time";
const PATH_SET_WINNING_NUMBER: &str = "/game/admin/set-winning-number";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeResponse {
    current_time: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WinningNumberRequest {
    winning_number: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WinningNumberResponse {
    winning_number: i64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// JSON-over-HTTP transport for the game backend.
///
/// Every request carries `Content-Type: application/json` and, when a token
/// is configured, `Authorization: Bearer <token>`.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(
        base_url: &str,
        token: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, RoundCtlError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| RoundCtlError::Config(format!("invalid API token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| RoundCtlError::Transport(format!("HTTP client setup failed: {e}")))?;

        Ok(Self {
            client,
            // Strip trailing slash for consistent URL construction
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-success response into `Rejected`, preferring the server's `message`.
    async fn rejection(resp: Response, fallback: &str) -> RoundCtlError {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());

        warn!(%status, %message, "backend rejected request");
        RoundCtlError::Rejected(message)
    }
}

#[async_trait(?Send)]
impl GameTransport for HttpTransport {
    async fn fetch_server_time(&self) -> Result<i64, RoundCtlError> {
        let resp = self
            .client
            .get(self.url(PATH_TIME))
            .send()
            .await
            .map_err(|e| RoundCtlError::Transport(format!("GET {PATH_TIME} failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(Self::rejection(resp, MSG_TIME_FETCH_FAILED).await);
        }

        let body: TimeResponse = resp
            .json()
            .await
            .map_err(|e| RoundCtlError::Serialization(format!("time response: {e}")))?;

        let millis = parse_server_time(&body.current_time)?;
        debug!(current_time = %body.current_time, "fetched server time");
        Ok(millis)
    }

    async fn submit_winning_number(&self, number: u8) -> Result<u8, RoundCtlError> {
        let resp = self
            .client
            .post(self.url(PATH_SET_WINNING_NUMBER))
            .json(&WinningNumberRequest {
                winning_number: number,
            })
            .send()
            .await
            .map_err(|e| {
                RoundCtlError::Transport(format!("POST {PATH_SET_WINNING_NUMBER} failed: {e}"))
            })?;

        if !resp.status().is_success() {
            return Err(Self::rejection(resp, MSG_COMMIT_FAILED).await);
        }

        let body: WinningNumberResponse = resp
            .json()
            .await
            .map_err(|e| RoundCtlError::Serialization(format!("winning number response: {e}")))?;

        u8::try_from(body.winning_number)
            .ok()
            .filter(|&n| n <= MAX_DIGIT)
            .ok_or_else(|| {
                RoundCtlError::InvalidData(format!(
                    "server echoed winning number {}",
                    body.winning_number
                ))
            })
    }
}
