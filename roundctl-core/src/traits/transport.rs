use async_trait::async_trait;
use crate::error::RoundCtlError;

/// The two backend calls the round controller depends on.
#[async_trait(?Send)]
pub trait GameTransport {
    /// Current server time in milliseconds since the Unix epoch.
    async fn fetch_server_time(&self) -> Result<i64, RoundCtlError>;

    /// Record `number` as the winning number. Returns the number echoed back.
    async fn submit_winning_number(&self, number: u8) -> Result<u8, RoundCtlError>;
}
