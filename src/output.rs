// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use serde::Serialize;
use std::time::Instant;

use crate::types::Endpoint;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with step-by-step narration
    Normal,
    /// Minimal output for CI (only the final endpoint)
    Quiet,
    /// JSON lines for scripting
    Json,
}

impl OutputMode {
    pub fn from_flags(quiet: bool, json: bool) -> Self {
        if json {
            OutputMode::Json
        } else if quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    started: Instant,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            started: Instant::now(),
        }
    }

    /// Narrate one provisioning step (suppressed in quiet/json mode).
    pub fn step(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("  → {message}");
        }
    }

    /// Print a plain informational line (suppressed in json mode).
    pub fn line(&self, message: &str) {
        if self.mode != OutputMode::Json {
            println!("{message}");
        }
    }

    /// Report the final resolved endpoint. This is the one line every mode
    /// emits.
    pub fn deployed(&self, endpoint: &Endpoint) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.started.elapsed().as_secs_f64();
                println!("  ✓ Deployed: {endpoint} ({elapsed:.1}s)");
            }
            OutputMode::Quiet => {
                println!("{endpoint}");
            }
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "deployed",
                    message: &endpoint.to_string(),
                    duration_secs: Some(self.started.elapsed().as_secs_f64()),
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    println!("{json}");
                }
            }
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "error",
                    message,
                    duration_secs: None,
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    eprintln!("{json}");
                }
            }
        }
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_wins_over_quiet() {
        assert_eq!(OutputMode::from_flags(true, true), OutputMode::Json);
        assert_eq!(OutputMode::from_flags(true, false), OutputMode::Quiet);
        assert_eq!(OutputMode::from_flags(false, false), OutputMode::Normal);
    }
}
