//! When a digit may be picked and when a commit may be sent.

use std::fmt;

use crate::constants::{MAX_DIGIT, SUBMIT_WINDOW_START};

/// Commit policy chosen by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The selected number is committed automatically at round rollover.
    Auto,
    /// The operator confirms the commit inside the submit window.
    Manual,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::Auto => Mode::Manual,
            Mode::Manual => Mode::Auto,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Auto => f.write_str("auto"),
            Mode::Manual => f.write_str("manual"),
        }
    }
}

/// True during the last ten seconds of a round.
pub fn in_submit_window(server_second: u8) -> bool {
    server_second >= SUBMIT_WINDOW_START
}

/// Submit button enablement.
pub fn can_submit(server_second: u8) -> bool {
    in_submit_window(server_second)
}

/// Whether digit buttons are enabled at all.
pub fn selection_enabled(mode: Mode, server_second: u8) -> bool {
    mode == Mode::Manual || in_submit_window(server_second)
}

/// Enable/disable matrix for a single digit button.
///
/// In auto mode the first pick locks the round: only the already selected
/// digit stays selectable until a mode switch or rollover clears it.
pub fn is_digit_selectable(
    digit: u8,
    mode: Mode,
    server_second: u8,
    selected: Option<u8>,
) -> bool {
    if digit > MAX_DIGIT || !selection_enabled(mode, server_second) {
        return false;
    }
    match (mode, selected) {
        (Mode::Auto, Some(locked)) => locked == digit,
        _ => true,
    }
}
