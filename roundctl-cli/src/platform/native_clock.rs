use std::time::SystemTime;

use roundctl_core::error::RoundCtlError;
use roundctl_core::traits::clock::Clock;

/// Native Clock implementation using std::time::SystemTime.
pub struct NativeClock;

impl NativeClock {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NativeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for NativeClock {
    fn now_millis(&self) -> Result<i64, RoundCtlError> {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .map_err(|e| RoundCtlError::Platform(format!("SystemTime error: {e}")))
    }
}
