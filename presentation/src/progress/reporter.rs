//! Progress reporting for deliberations

use colored::Colorize;
use council_application::DeliberationProgress;
use council_domain::{ConsensusRecord, DeliberationId, ResponderId, ResponseOutcome};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Reports progress during a deliberation with a progress bar
pub struct ProgressReporter {
    multi: MultiProgress,
    dispatch_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            dispatch_bar: Mutex::new(None),
        }
    }

    fn dispatch_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn outcome_mark(outcome: &ResponseOutcome) -> colored::ColoredString {
        match outcome {
            ResponseOutcome::Succeeded => "v".green(),
            ResponseOutcome::TimedOut => "t".yellow(),
            ResponseOutcome::Errored { .. } => "x".red(),
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl DeliberationProgress for ProgressReporter {
    fn on_dispatch_start(&self, _deliberation_id: DeliberationId, responders: usize) {
        let pb = self.multi.add(ProgressBar::new(responders as u64));
        pb.set_style(Self::dispatch_style());
        pb.set_prefix("Consulting council");
        pb.set_message("Waiting for responders...");

        if let Ok(mut bar) = self.dispatch_bar.lock() {
            *bar = Some(pb);
        }
    }

    fn on_responder_complete(&self, responder_id: &ResponderId, outcome: &ResponseOutcome) {
        if let Ok(bar) = self.dispatch_bar.lock()
            && let Some(pb) = bar.as_ref()
        {
            pb.set_message(format!("{} {}", Self::outcome_mark(outcome), responder_id));
            pb.inc(1);
        }
    }

    fn on_consensus(&self, record: &ConsensusRecord) {
        if let Ok(mut bar) = self.dispatch_bar.lock()
            && let Some(pb) = bar.take()
        {
            pb.finish_with_message(format!("{}", record.disposition.as_str().green()));
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl DeliberationProgress for SimpleProgress {
    fn on_dispatch_start(&self, deliberation_id: DeliberationId, responders: usize) {
        println!(
            "{} {} {} ({} responders)",
            "->".cyan(),
            "Deliberation".bold(),
            deliberation_id,
            responders
        );
    }

    fn on_responder_complete(&self, responder_id: &ResponderId, outcome: &ResponseOutcome) {
        match outcome {
            ResponseOutcome::Succeeded => println!("  {} {}", "v".green(), responder_id),
            ResponseOutcome::TimedOut => {
                println!("  {} {} (timed out)", "t".yellow(), responder_id)
            }
            ResponseOutcome::Errored { message } => {
                println!("  {} {} ({})", "x".red(), responder_id, message)
            }
        }
    }

    fn on_consensus(&self, record: &ConsensusRecord) {
        println!(
            "{} {} ({:.0}% agreement)\n",
            "->".cyan(),
            record.disposition.as_str().bold(),
            record.agreement_fraction * 100.0
        );
    }
}
