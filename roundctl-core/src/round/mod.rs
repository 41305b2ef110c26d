//! Round state machine and the persisted round counter.

pub mod controller;
pub mod store;

pub use controller::{
    CommitRequest, CommitTicket, RoundController, RoundSnapshot, SelectionError, SubmissionStatus,
    SubmitError, TickOutcome,
};
