//! CLI command implementations (control, time, status, round).

pub mod control;
pub mod time;
pub mod status;
pub mod round;

use crate::config::Config;
use crate::transport::HttpTransport;

/// HTTP transport for the configured backend.
pub(crate) fn connect(config: &Config) -> Result<HttpTransport, Box<dyn std::error::Error>> {
    let transport = HttpTransport::new(
        &config.api_url,
        config.api_token.as_deref(),
        config.http_timeout,
    )?;
    Ok(transport)
}
