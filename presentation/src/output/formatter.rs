//! Output formatter trait

use council_domain::DeliberationResult;

/// Trait for formatting deliberation results
pub trait OutputFormatter {
    /// Format the complete result
    fn format(&self, result: &DeliberationResult) -> String;

    /// Format as JSON
    fn format_json(&self, result: &DeliberationResult) -> String;

    /// Format the outcome only (concise output)
    fn format_summary(&self, result: &DeliberationResult) -> String;
}
