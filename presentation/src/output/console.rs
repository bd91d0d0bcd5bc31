//! Console output formatter for interview sessions

use colored::Colorize;
use lattia_domain::{HealthData, InterviewState};

/// Formats interview output for terminal display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// An assistant reply
    pub fn assistant(text: &str) -> String {
        format!("{} {}", "assistant>".green().bold(), text)
    }

    /// Turn budget report and completion flag
    pub fn progress(state: &InterviewState) -> String {
        let mut output = String::new();
        output.push_str(&Self::header("Interview Progress"));
        output.push('\n');
        output.push_str(&state.stats().summary());
        output.push('\n');

        let status = if state.is_done() {
            "complete".green().bold()
        } else {
            "in progress".yellow().bold()
        };
        output.push_str(&format!("\n{} {}\n", "Status:".cyan().bold(), status));
        output.push_str(&format!(
            "{} {} collected, {} pending\n",
            "Fields:".cyan().bold(),
            state.collected_fields().count(),
            state.pending_fields().count()
        ));
        output.push_str(&Self::footer());
        output
    }

    /// Collected values grouped by domain
    pub fn health_data(data: &HealthData) -> String {
        if data.is_empty() {
            return format!("{}\n", "No data collected yet.".dimmed());
        }

        let mut output = String::new();
        output.push_str(&Self::header("Collected Health Data"));
        output.push('\n');
        for (domain, entries) in data {
            output.push_str(&Self::section_header(domain.display_name()));
            for entry in entries.values() {
                let value = entry
                    .options
                    .as_ref()
                    .and_then(|o| o.get(&entry.value))
                    .unwrap_or(&entry.value);
                output.push_str(&format!(
                    "  {} {} {}\n",
                    format!("{}:", entry.name).bold(),
                    value,
                    format!("({})", entry.key).dimmed()
                ));
            }
        }
        output.push_str(&Self::footer());
        output
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}
