//! Text rendering of the Game Control panel and parsing of operator input.

use roundctl_core::constants::SUBMIT_WINDOW_START;

use super::driver::{ControlEvent, OperatorCommand};

/// Map one line typed by the operator to a command.
///
/// `0`-`9` select, `m` toggles the mode, `s` submits, `q` quits.
pub fn parse_operator_input(line: &str) -> Option<OperatorCommand> {
    let line = line.trim().to_ascii_lowercase();
    match line.as_str() {
        "m" | "mode" => Some(OperatorCommand::ToggleMode),
        "s" | "submit" => Some(OperatorCommand::Submit),
        "q" | "quit" | "exit" => Some(OperatorCommand::Quit),
        digit if digit.len() == 1 => digit
            .chars()
            .next()
            .and_then(|c| c.to_digit(10))
            .map(|d| OperatorCommand::Select(d as u8)),
        _ => None,
    }
}

/// One line of panel output for an event, or `None` when nothing needs printing.
pub fn render(event: &ControlEvent) -> Option<String> {
    let line = match event {
        ControlEvent::Synced {
            offset_millis,
            round,
            mode,
        } => format!(
            "Synchronised with server clock (offset {offset_millis:+} ms). Round {round}, {mode} mode."
        ),
        ControlEvent::Tick {
            server_second,
            seconds_left,
            window_open,
        } => {
            // One line per five seconds, then every second inside the window.
            if !window_open && server_second % 5 != 0 {
                return None;
            }
            let state = if *window_open {
                "submission window OPEN".to_string()
            } else {
                format!("window opens at :{SUBMIT_WINDOW_START}")
            };
            format!("[:{server_second:02}] {seconds_left:2}s left - {state}")
        }
        ControlEvent::RoundAdvanced { round } => format!("Round {round}"),
        ControlEvent::Selected { number } => format!("Selected number {number}"),
        ControlEvent::ModeChanged { mode } => format!("Mode: {mode} (selection cleared)"),
        ControlEvent::CommitStarted { number } => format!("Submitting winning number {number}..."),
        ControlEvent::CommitSucceeded { number } => {
            format!("Winning number {number} recorded")
        }
        ControlEvent::CommitFailed { message } => format!("Submission failed: {message}"),
        ControlEvent::Resynced { offset_millis } => {
            format!("Re-synchronised server clock (offset {offset_millis:+} ms)")
        }
        ControlEvent::Warning(message) => format!("Warning: {message}"),
    };
    Some(line)
}
