/// Length of one round in seconds.
pub const ROUND_SECONDS: u8 = 60;

/// First server second of the submit window (last ten seconds of a round).
pub const SUBMIT_WINDOW_START: u8 = 50;

/// Highest digit an operator may pick as winning number.
pub const MAX_DIGIT: u8 = 9;

/// Default tick period of the round timer, in milliseconds.
pub const DEFAULT_TICK_MILLIS: u64 = 200;

/// Round counter used when nothing valid is persisted.
pub const INITIAL_ROUND: u64 = 1;

/// Storage key holding the round counter as a decimal string.
pub const KEY_ROUND: &str = "round";

/// Shown when the time endpoint fails without a message of its own.
pub const MSG_TIME_FETCH_FAILED: &str = "Failed to fetch server time";

/// Shown when a commit fails without a message of its own.
pub const MSG_COMMIT_FAILED: &str = "Failed to set winning number";
