use crate::error::RoundCtlError;

pub trait Clock {
    /// Milliseconds since the Unix epoch on the local clock.
    fn now_millis(&self) -> Result<i64, RoundCtlError>;
}
