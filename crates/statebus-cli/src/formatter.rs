//! Output formatters for replay results.

use clap::ValueEnum;
use statebus::EventBinding;

use crate::replay::ReplayStep;

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    Text,
    /// One JSON document per line
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Format one replayed transition.
pub fn format_step(step: &ReplayStep, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string(step).unwrap_or_else(|_| "{}".to_string()),
        OutputFormat::Text => {
            if step.deliveries.is_empty() {
                let changed = if step.changed_keys.is_empty() {
                    "nothing changed".to_string()
                } else {
                    format!("changed: {}", step.changed_keys.join(", "))
                };
                return format!("[{}] no events ({})", step.index, changed);
            }

            step.deliveries
                .iter()
                .map(|d| format!("[{}] {} <- {}", step.index, d.event_name, d.value))
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}

/// Format the state key to event name table.
pub fn format_bindings(bindings: &[EventBinding], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(bindings).unwrap_or_else(|_| "[]".to_string())
        }
        OutputFormat::Text => {
            let width = bindings
                .iter()
                .map(|b| b.state_key.chars().count())
                .max()
                .unwrap_or(0);

            bindings
                .iter()
                .map(|b| format!("{:<width$}  {}", b.state_key, b.event_name, width = width))
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}
