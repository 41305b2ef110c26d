use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::constants::{MAX_DIGIT, MSG_COMMIT_FAILED};
use crate::gate::{can_submit, is_digit_selectable, selection_enabled, Mode};

/// Outcome of the last commit call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStatus {
    Idle,
    Loading,
    Succeeded,
    Failed,
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SubmissionStatus::Idle => "idle",
            SubmissionStatus::Loading => "loading",
            SubmissionStatus::Succeeded => "succeeded",
            SubmissionStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Identifies one issued commit. Only the most recent ticket may update state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommitTicket(u64);

/// A commit the caller must send to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitRequest {
    pub ticket: CommitTicket,
    pub number: u8,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("digit {0} is out of range 0-9")]
    OutOfRange(u8),

    #[error("selection opens at second 50 in auto mode")]
    WindowClosed,

    #[error("number {0} is already locked in for this round")]
    Locked(u8),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("manual submit is only available in manual mode")]
    NotManual,

    #[error("no number selected")]
    NothingSelected,

    #[error("submission is only allowed in the last 10 seconds of the round")]
    WindowClosed,
}

/// What a single tick observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub server_second: u8,
    pub rolled_over: bool,
    /// False when a manual submit already advanced the round being closed.
    pub round_advanced: bool,
    /// Set when auto mode armed a number for this rollover.
    pub commit: Option<CommitRequest>,
}

/// Read-only view of the controller for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSnapshot {
    pub round: u64,
    pub mode: Mode,
    pub selected: Option<u8>,
    pub status: SubmissionStatus,
    pub latest_winning_number: Option<u8>,
    pub last_error: Option<String>,
}

/// Per-round state machine.
///
/// ```text
/// IDLE -> SELECTING -> [auto]   rollover        -> COMMITTING -> SUCCEEDED | FAILED
///                      [manual] submit (window) -> COMMITTING -> SUCCEEDED | FAILED
/// ```
///
/// The controller never performs I/O. Ticks and operator actions return the
/// commits to send; responses come back through [`RoundController::apply_commit_result`].
#[derive(Debug)]
pub struct RoundController {
    round: u64,
    mode: Mode,
    selected: Option<u8>,
    status: SubmissionStatus,
    latest_winning_number: Option<u8>,
    last_error: Option<String>,
    last_second: Option<u8>,
    submitted_this_round: bool,
    next_ticket: u64,
    in_flight: Option<CommitTicket>,
}

impl RoundController {
    pub fn new(round: u64, mode: Mode) -> Self {
        Self {
            round,
            mode,
            selected: None,
            status: SubmissionStatus::Idle,
            latest_winning_number: None,
            last_error: None,
            last_second: None,
            submitted_this_round: false,
            next_ticket: 0,
            in_flight: None,
        }
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn selected(&self) -> Option<u8> {
        self.selected
    }

    pub fn status(&self) -> SubmissionStatus {
        self.status
    }

    pub fn latest_winning_number(&self) -> Option<u8> {
        self.latest_winning_number
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            round: self.round,
            mode: self.mode,
            selected: self.selected,
            status: self.status,
            latest_winning_number: self.latest_winning_number,
            last_error: self.last_error.clone(),
        }
    }

    /// Pick the winning number for the current round. State is unchanged on error.
    pub fn select_number(&mut self, digit: u8, server_second: u8) -> Result<(), SelectionError> {
        if digit > MAX_DIGIT {
            return Err(SelectionError::OutOfRange(digit));
        }
        if !selection_enabled(self.mode, server_second) {
            return Err(SelectionError::WindowClosed);
        }
        if !is_digit_selectable(digit, self.mode, server_second, self.selected) {
            // Only reachable through the auto-mode lock.
            return Err(SelectionError::Locked(self.selected.unwrap_or(digit)));
        }
        self.selected = Some(digit);
        debug!(digit, server_second, mode = %self.mode, "number selected");
        Ok(())
    }

    /// Flip auto/manual. Always clears the selection.
    pub fn toggle_mode(&mut self) -> Mode {
        self.mode = self.mode.toggled();
        self.selected = None;
        self.mode
    }

    /// Advance the controller to `server_second`.
    ///
    /// A rollover is the minute wrapping: a second lower than the previous
    /// sample, normally 59 -> 0. A late tick that skips 0 (59 -> 1) still
    /// counts. Repeated samples of the same second, and the first sample,
    /// do not. Seconds must come from a clock that never runs backwards.
    ///
    /// The round advances unless a manual submit already advanced it.
    pub fn tick(&mut self, server_second: u8) -> TickOutcome {
        let rolled_over = matches!(self.last_second, Some(prev) if server_second < prev);
        self.last_second = Some(server_second);

        if !rolled_over {
            return TickOutcome {
                server_second,
                rolled_over,
                round_advanced: false,
                commit: None,
            };
        }

        let commit = match (self.mode, self.selected) {
            (Mode::Auto, Some(number)) => Some(self.begin_commit(number)),
            _ => None,
        };
        self.selected = None;
        let round_advanced = !self.submitted_this_round;
        if round_advanced {
            self.round += 1;
        }
        self.submitted_this_round = false;

        TickOutcome {
            server_second,
            rolled_over,
            round_advanced,
            commit,
        }
    }

    /// Operator confirmation in manual mode. Bumps the round optimistically.
    pub fn submit_manual(&mut self, server_second: u8) -> Result<CommitRequest, SubmitError> {
        if self.mode != Mode::Manual {
            return Err(SubmitError::NotManual);
        }
        let number = self.selected.ok_or(SubmitError::NothingSelected)?;
        if !can_submit(server_second) {
            return Err(SubmitError::WindowClosed);
        }

        let request = self.begin_commit(number);
        self.round += 1;
        self.submitted_this_round = true;
        Ok(request)
    }

    /// Record the backend's answer for `ticket`.
    ///
    /// Returns `false` and leaves state untouched when a newer commit has
    /// been issued since, or the result was already applied.
    pub fn apply_commit_result(
        &mut self,
        ticket: CommitTicket,
        result: Result<u8, String>,
    ) -> bool {
        if self.in_flight != Some(ticket) {
            debug!(?ticket, "discarding stale commit response");
            return false;
        }
        self.in_flight = None;

        match result {
            Ok(number) => {
                self.status = SubmissionStatus::Succeeded;
                self.latest_winning_number = Some(number);
                self.last_error = None;
            }
            Err(message) => {
                self.status = SubmissionStatus::Failed;
                let message = message.trim();
                self.last_error = Some(if message.is_empty() {
                    MSG_COMMIT_FAILED.to_string()
                } else {
                    message.to_string()
                });
            }
        }
        true
    }

    fn begin_commit(&mut self, number: u8) -> CommitRequest {
        let ticket = CommitTicket(self.next_ticket);
        self.next_ticket += 1;
        self.in_flight = Some(ticket);
        self.status = SubmissionStatus::Loading;
        self.selected = None;
        CommitRequest { ticket, number }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed seconds in order and collect every commit issued.
    fn run_seconds(ctrl: &mut RoundController, seconds: &[u8]) -> Vec<CommitRequest> {
        seconds.iter().filter_map(|&s| ctrl.tick(s).commit).collect()
    }

    #[test]
    fn test_auto_select_rejected_before_window() {
        let mut ctrl = RoundController::new(1, Mode::Auto);
        assert_eq!(ctrl.select_number(4, 49), Err(SelectionError::WindowClosed));
        assert_eq!(ctrl.selected(), None);
        assert_eq!(ctrl.snapshot(), RoundController::new(1, Mode::Auto).snapshot());
    }

    #[test]
    fn test_manual_select_always_accepted() {
        let mut ctrl = RoundController::new(1, Mode::Manual);
        for second in 0..60 {
            assert!(ctrl.select_number(second % 10, second).is_ok());
        }
        assert_eq!(ctrl.selected(), Some(9));
    }

    #[test]
    fn test_auto_first_choice_wins() {
        let mut ctrl = RoundController::new(1, Mode::Auto);
        ctrl.select_number(7, 51).unwrap();
        assert_eq!(ctrl.select_number(2, 52), Err(SelectionError::Locked(7)));
        assert!(ctrl.select_number(7, 53).is_ok());
        assert_eq!(ctrl.selected(), Some(7));
    }

    #[test]
    fn test_out_of_range_digit() {
        let mut ctrl = RoundController::new(1, Mode::Manual);
        assert_eq!(ctrl.select_number(12, 55), Err(SelectionError::OutOfRange(12)));
    }

    #[test]
    fn test_toggle_mode_always_clears_selection() {
        let mut ctrl = RoundController::new(1, Mode::Manual);
        ctrl.select_number(3, 10).unwrap();
        assert_eq!(ctrl.toggle_mode(), Mode::Auto);
        assert_eq!(ctrl.selected(), None);

        ctrl.select_number(5, 55).unwrap();
        assert_eq!(ctrl.toggle_mode(), Mode::Manual);
        assert_eq!(ctrl.selected(), None);

        assert_eq!(ctrl.toggle_mode(), Mode::Auto);
        assert_eq!(ctrl.selected(), None);
    }

    #[test]
    fn test_auto_rollover_commits_selected_number_once() {
        let mut ctrl = RoundController::new(4, Mode::Auto);
        ctrl.tick(50);
        ctrl.select_number(7, 51).unwrap();

        // 200ms ticks sample second 0 several times.
        let commits = run_seconds(&mut ctrl, &[51, 58, 59, 59, 0, 0, 0, 0, 0, 1, 1]);
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].number, 7);
        assert_eq!(ctrl.round(), 5);
        assert_eq!(ctrl.status(), SubmissionStatus::Loading);
        assert_eq!(ctrl.selected(), None);
    }

    #[test]
    fn test_auto_rollover_without_selection_issues_nothing() {
        let mut ctrl = RoundController::new(1, Mode::Auto);
        let commits = run_seconds(&mut ctrl, &[57, 58, 59, 0, 0, 1]);
        assert!(commits.is_empty());
        assert_eq!(ctrl.round(), 2);
        assert_eq!(ctrl.status(), SubmissionStatus::Idle);
    }

    #[test]
    fn test_first_tick_at_zero_is_not_a_rollover() {
        let mut ctrl = RoundController::new(1, Mode::Auto);
        let outcome = ctrl.tick(0);
        assert!(!outcome.rolled_over);
        assert_eq!(ctrl.round(), 1);
    }

    #[test]
    fn test_rollover_every_minute() {
        let mut ctrl = RoundController::new(1, Mode::Manual);
        for _ in 0..3 {
            for second in 0..60 {
                ctrl.tick(second);
            }
        }
        // First pass starts at 0 without a transition; two real rollovers follow.
        assert_eq!(ctrl.round(), 3);
    }

    #[test]
    fn test_manual_rollover_does_not_commit() {
        let mut ctrl = RoundController::new(1, Mode::Manual);
        ctrl.select_number(3, 10).unwrap();
        let commits = run_seconds(&mut ctrl, &[58, 59, 0]);
        assert!(commits.is_empty());
        assert_eq!(ctrl.round(), 2);
        assert_eq!(ctrl.selected(), None);
    }

    #[test]
    fn test_manual_submit_gated_by_window() {
        let mut ctrl = RoundController::new(8, Mode::Manual);
        ctrl.select_number(3, 10).unwrap();
        assert!(!can_submit(10));
        assert_eq!(ctrl.submit_manual(10), Err(SubmitError::WindowClosed));
        assert_eq!(ctrl.round(), 8);

        assert!(can_submit(52));
        let request = ctrl.submit_manual(52).unwrap();
        assert_eq!(request.number, 3);
        assert_eq!(ctrl.round(), 9);
        assert_eq!(ctrl.status(), SubmissionStatus::Loading);
        assert_eq!(ctrl.selected(), None);
    }

    #[test]
    fn test_manual_submit_then_rollover_advances_round_once() {
        let mut ctrl = RoundController::new(8, Mode::Manual);
        ctrl.tick(50);
        ctrl.select_number(3, 51).unwrap();
        ctrl.submit_manual(52).unwrap();
        assert_eq!(ctrl.round(), 9);

        let mut advanced = Vec::new();
        for second in [53, 54, 55, 56, 57, 58, 59, 0, 0, 1] {
            let outcome = ctrl.tick(second);
            if outcome.rolled_over {
                advanced.push(outcome.round_advanced);
            }
        }
        assert_eq!(advanced, vec![false]);
        assert_eq!(ctrl.round(), 9);

        // The next round without a submit rolls normally.
        for second in (2..60).chain([0]) {
            ctrl.tick(second);
        }
        assert_eq!(ctrl.round(), 10);
    }

    #[test]
    fn test_rollover_detected_when_zero_is_skipped() {
        let mut ctrl = RoundController::new(4, Mode::Auto);
        ctrl.tick(55);
        ctrl.select_number(7, 55).unwrap();
        let commits = run_seconds(&mut ctrl, &[58, 59, 1, 2]);
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].number, 7);
        assert_eq!(ctrl.round(), 5);
    }

    #[test]
    fn test_manual_submit_requires_selection_and_mode() {
        let mut ctrl = RoundController::new(1, Mode::Manual);
        assert_eq!(ctrl.submit_manual(55), Err(SubmitError::NothingSelected));

        let mut auto = RoundController::new(1, Mode::Auto);
        auto.select_number(1, 55).unwrap();
        assert_eq!(auto.submit_manual(55), Err(SubmitError::NotManual));
        assert_eq!(auto.round(), 1);
    }

    #[test]
    fn test_each_manual_submit_bumps_round_once() {
        let mut ctrl = RoundController::new(1, Mode::Manual);
        ctrl.select_number(2, 50).unwrap();
        ctrl.submit_manual(50).unwrap();
        ctrl.select_number(6, 51).unwrap();
        ctrl.submit_manual(51).unwrap();
        assert_eq!(ctrl.round(), 3);
    }

    #[test]
    fn test_failed_commit_then_success_overwrites() {
        let mut ctrl = RoundController::new(1, Mode::Manual);
        ctrl.select_number(4, 55).unwrap();
        let first = ctrl.submit_manual(55).unwrap();
        assert!(ctrl.apply_commit_result(first.ticket, Err("invalid number".to_string())));
        assert_eq!(ctrl.status(), SubmissionStatus::Failed);
        assert_eq!(ctrl.last_error(), Some("invalid number"));

        ctrl.select_number(5, 56).unwrap();
        let second = ctrl.submit_manual(56).unwrap();
        assert!(ctrl.apply_commit_result(second.ticket, Ok(5)));
        assert_eq!(ctrl.status(), SubmissionStatus::Succeeded);
        assert_eq!(ctrl.latest_winning_number(), Some(5));
        assert_eq!(ctrl.last_error(), None);
    }

    #[test]
    fn test_blank_failure_message_gets_fallback() {
        let mut ctrl = RoundController::new(1, Mode::Manual);
        ctrl.select_number(4, 55).unwrap();
        let req = ctrl.submit_manual(55).unwrap();
        ctrl.apply_commit_result(req.ticket, Err("  ".to_string()));
        assert_eq!(ctrl.last_error(), Some(MSG_COMMIT_FAILED));
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut ctrl = RoundController::new(1, Mode::Manual);
        ctrl.select_number(1, 50).unwrap();
        let old = ctrl.submit_manual(50).unwrap();
        ctrl.select_number(2, 51).unwrap();
        let new = ctrl.submit_manual(51).unwrap();

        assert!(!ctrl.apply_commit_result(old.ticket, Ok(1)));
        assert_eq!(ctrl.status(), SubmissionStatus::Loading);

        assert!(ctrl.apply_commit_result(new.ticket, Ok(2)));
        assert_eq!(ctrl.latest_winning_number(), Some(2));

        // Applying the same ticket twice is a no-op.
        assert!(!ctrl.apply_commit_result(new.ticket, Err("late".to_string())));
        assert_eq!(ctrl.status(), SubmissionStatus::Succeeded);
    }

    #[test]
    fn test_auto_commit_response_lands_in_next_round() {
        let mut ctrl = RoundController::new(1, Mode::Auto);
        ctrl.tick(55);
        ctrl.select_number(9, 55).unwrap();
        let commit = run_seconds(&mut ctrl, &[59, 0]).pop().unwrap();
        ctrl.tick(1);
        ctrl.tick(2);
        assert!(ctrl.apply_commit_result(commit.ticket, Ok(9)));
        assert_eq!(ctrl.latest_winning_number(), Some(9));
        assert_eq!(ctrl.round(), 2);
    }
}
