//! Platform-independent round control for the numbers game operator console.
//!
//! Clock synchronisation, the submission gate and the round state machine live
//! here so the native CLI and any future front end share identical timing rules.

pub mod error;
pub mod constants;
pub mod traits;
pub mod clock_sync;
pub mod gate;
pub mod round;
