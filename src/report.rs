//! Outcome reporting at the UI boundary.
use crate::attempt::{StrategyAttempt, VerificationStatus};
use crate::dispatch::SubmissionOutcome;
use anyhow::{Context, Result};
use std::io::Write;

pub trait OutcomeReporter {
    fn report(&mut self, outcome: &SubmissionOutcome) -> Result<()>;
}

/// One-line summary of the aggregated outcome.
pub fn headline(outcome: &SubmissionOutcome) -> String {
    match (outcome.success, outcome.confirmed, outcome.succeeding_strategy) {
        (true, true, Some(strategy)) => format!("delivered (confirmed via {strategy})"),
        (true, false, Some(strategy)) => {
            format!("delivered (unconfirmed; best signal from {strategy})")
        }
        (true, _, None) => "delivered".to_string(),
        (false, _, _) => format!(
            "not delivered: {}",
            outcome.reason.as_deref().unwrap_or("unknown reason")
        ),
    }
}

pub struct TextReporter<W: Write> {
    out: W,
}

impl<W: Write> TextReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> OutcomeReporter for TextReporter<W> {
    fn report(&mut self, outcome: &SubmissionOutcome) -> Result<()> {
        writeln!(self.out, "submission: {}", headline(outcome)).context("write report")?;
        for (index, attempt) in outcome.attempts.iter().enumerate() {
            writeln!(self.out, "  {}. {}", index + 1, attempt_line(attempt))
                .context("write report")?;
        }
        if outcome.success && !outcome.confirmed {
            writeln!(
                self.out,
                "note: the endpoint cannot confirm receipt; check the survey before resubmitting"
            )
            .context("write report")?;
        }
        if outcome.succeeding_strategy == Some(crate::attempt::StrategyName::RedirectHandoff) {
            writeln!(
                self.out,
                "note: finish the submission in the browser window that was opened"
            )
            .context("write report")?;
        }
        Ok(())
    }
}

fn attempt_line(attempt: &StrategyAttempt) -> String {
    let mut line = format!(
        "{:<18} {:<13} {:>6}ms",
        attempt.strategy.as_str(),
        attempt.verified.as_str(),
        attempt.duration_ms()
    );
    if let Some(raw) = attempt.raw_status {
        line.push_str(&format!("  [{raw}]"));
    }
    if attempt.verified == VerificationStatus::Refuted {
        if let Some(issue) = attempt.issue {
            line.push_str(&format!("  ({})", issue.as_str()));
        }
        if let Some(error) = attempt.error.as_deref() {
            line.push_str(&format!("  {error}"));
        }
    }
    line
}

pub struct JsonReporter<W: Write> {
    out: W,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> OutcomeReporter for JsonReporter<W> {
    fn report(&mut self, outcome: &SubmissionOutcome) -> Result<()> {
        let json = serde_json::to_string_pretty(outcome).context("serialize outcome")?;
        writeln!(self.out, "{json}").context("write report")?;
        Ok(())
    }
}
