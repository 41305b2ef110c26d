//! Live Game Control: the round timer loop and its text panel.

pub mod driver;
pub mod panel;

pub use driver::{DriverSettings, OperatorCommand, RoundDriver};
