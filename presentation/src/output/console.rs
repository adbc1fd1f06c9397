//! Console output formatter for deliberation results

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use council_domain::{
    AgentResponse, ConsensusRecord, DeliberationResult, Disposition, EvidenceTrail,
    ResponseOutcome,
};

/// Formats deliberation results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete result
    pub fn format(result: &DeliberationResult) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Council Deliberation"));
        output.push('\n');

        let deliberation = &result.deliberation;
        output.push_str(&format!(
            "{} {}\n",
            "Query:".cyan().bold(),
            deliberation.query
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Deliberation:".cyan().bold(),
            deliberation.id
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Threshold:".cyan().bold(),
            deliberation.consensus_threshold
        ));

        output.push_str(&Self::section_header("Responses"));
        for response in &result.agent_responses {
            output.push_str(&Self::format_response(response));
        }

        if let Some(record) = &result.consensus_record {
            output.push_str(&Self::section_header("Agreement"));
            output.push_str(&Self::format_clusters(record));
        }

        if let Some(trail) = &result.evidence_trail
            && !trail.claims.is_empty()
        {
            output.push_str(&Self::section_header("Evidence Trail"));
            output.push_str(&Self::format_trail(trail));
        }

        output.push_str(&Self::section_header("Outcome"));
        output.push('\n');
        output.push_str(&Self::outcome(result));
        output.push_str(&Self::footer());

        output
    }

    /// Format as JSON
    pub fn format_json(result: &DeliberationResult) -> String {
        serde_json::to_string_pretty(result).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }

    /// Format the outcome only
    pub fn format_summary(result: &DeliberationResult) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n{}\n\n", "=== Council Verdict ===".cyan().bold()));
        output.push_str(&format!("{} {}\n\n", "Q:".bold(), result.deliberation.query));
        output.push_str(&format!(
            "{} {}/{}\n\n",
            "Responders answering:".dimmed(),
            result.successful_responses().count(),
            result.agent_responses.len()
        ));
        output.push_str(&Self::outcome(result));
        output
    }

    fn outcome(result: &DeliberationResult) -> String {
        let mut output = String::new();
        let Some(record) = &result.consensus_record else {
            let message = result
                .deliberation
                .error_message()
                .unwrap_or("no consensus record");
            output.push_str(&format!(
                "{} {} ({})\n",
                "Disposition:".bold(),
                result.deliberation.status().to_string().red().bold(),
                message
            ));
            return output;
        };

        output.push_str(&format!(
            "{} {}\n",
            "Disposition:".bold(),
            Self::disposition(record.disposition)
        ));
        output.push_str(&format!(
            "{} {:.1}   {} {:.0}%\n",
            "Confidence:".bold(),
            record.confidence_score,
            "Agreement:".bold(),
            record.agreement_fraction * 100.0
        ));
        if let Some(responder) = &record.final_responder_id {
            output.push_str(&format!("{} {}\n", "Answer from:".bold(), responder));
        }
        if !record.dissenting_responders.is_empty() {
            let dissent: Vec<&str> = record
                .dissenting_responders
                .iter()
                .map(|r| r.as_str())
                .collect();
            output.push_str(&format!("{} {}\n", "Dissent:".bold(), dissent.join(", ")));
        }
        if let Some(answer) = &record.final_response {
            output.push('\n');
            output.push_str(answer);
            output.push('\n');
        }
        if result.needs_review() {
            output.push_str(&format!(
                "\n{}\n",
                "Flag this result for human review before relying on it.".yellow()
            ));
        }
        output
    }

    fn disposition(disposition: Disposition) -> String {
        let label = disposition.as_str();
        match disposition {
            Disposition::ConsensusReached => label.green().bold().to_string(),
            Disposition::NoConsensus => label.yellow().bold().to_string(),
            Disposition::InsufficientResponses => label.red().bold().to_string(),
        }
    }

    fn format_response(response: &AgentResponse) -> String {
        let title = format!(
            "── {} (#{}, {}ms) ──",
            response.responder_id, response.sequence, response.latency_ms
        );
        match &response.outcome {
            ResponseOutcome::Succeeded => {
                let mut out = format!(
                    "\n{}\n{}\n{} {:.0}\n",
                    title.yellow().bold(),
                    response.answer,
                    "confidence:".dimmed(),
                    response.confidence
                );
                if !response.claims.is_empty() {
                    out.push_str(&Self::indent(
                        &response
                            .claims
                            .iter()
                            .map(|c| format!("- {}", c))
                            .collect::<Vec<_>>()
                            .join("\n"),
                        "  ",
                    ));
                    out.push('\n');
                }
                out
            }
            ResponseOutcome::TimedOut => format!("\n{}\nTimed out\n", title.red().bold()),
            ResponseOutcome::Errored { message } => {
                format!("\n{}\nError: {}\n", title.red().bold(), message)
            }
        }
    }

    fn format_clusters(record: &ConsensusRecord) -> String {
        let mut out = String::new();
        for cluster in &record.clusters {
            let marker = if record.selected_cluster == Some(cluster.index) {
                "*".green().bold().to_string()
            } else {
                " ".to_string()
            };
            let members: Vec<&str> = cluster.responder_ids.iter().map(|r| r.as_str()).collect();
            out.push_str(&format!(
                "\n{} cluster {}: weight {:.2}, mean confidence {:.1} [{}]\n",
                marker,
                cluster.index,
                cluster.weight,
                cluster.mean_confidence,
                members.join(", ")
            ));
        }
        out
    }

    fn format_trail(trail: &EvidenceTrail) -> String {
        let mut out = String::new();
        for claim in &trail.claims {
            let status = if claim.corroborated {
                "corroborated".green()
            } else if claim.in_final_response {
                "uncorroborated".yellow()
            } else {
                "dissent".dimmed()
            };
            out.push_str(&format!("\n[{}] {}\n", status, claim.claim));
            let sources: Vec<&str> = claim.sources().collect();
            if !sources.is_empty() {
                out.push_str(&Self::indent(&sources.join("\n"), "    source: "));
                out.push('\n');
            }
        }
        out
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

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, result: &DeliberationResult) -> String {
        Self::format(result)
    }

    fn format_json(&self, result: &DeliberationResult) -> String {
        Self::format_json(result)
    }

    fn format_summary(&self, result: &DeliberationResult) -> String {
        Self::format_summary(result)
    }
}
