//! Sequential strategy dispatch and outcome aggregation.
//!
//! Strategies run strictly one at a time in table order. Dispatch stops at
//! the first confirmed attempt. Because opaque attempts cannot be confirmed,
//! an earlier attempt may already have delivered when a later one runs;
//! duplicate submissions are an accepted risk.
use crate::attempt::{DeliveryIssue, StrategyAttempt, StrategyName, VerificationStatus};
use crate::payload::SubmissionPayload;
use crate::strategies::{build_strategies, StrategyContext, TransportStrategy};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

pub const REASON_ALL_FAILED: &str = "All submission methods failed";
pub const REASON_UNCONFIRMED: &str = "Delivery could not be confirmed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub success: bool,
    /// True only when an attempt positively confirmed delivery.
    pub confirmed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub succeeding_strategy: Option<StrategyName>,
    pub attempts: Vec<StrategyAttempt>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<DeliveryIssue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Trying(usize),
    Succeeded(StrategyName),
    Exhausted,
}

pub struct Dispatcher {
    strategies: Vec<Box<dyn TransportStrategy>>,
}

impl Dispatcher {
    pub fn new(strategies: Vec<Box<dyn TransportStrategy>>) -> Result<Self> {
        if strategies.is_empty() {
            return Err(anyhow!("dispatcher needs at least one strategy"));
        }
        Ok(Self { strategies })
    }

    /// Dispatcher over the fixed strategy table.
    pub fn standard(ctx: &StrategyContext) -> Result<Self> {
        Self::new(build_strategies(ctx))
    }

    pub fn strategy_names(&self) -> Vec<StrategyName> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run strategies in order until one confirms. Never fails.
    pub fn dispatch(&self, payload: &SubmissionPayload) -> SubmissionOutcome {
        let mut attempts = Vec::with_capacity(self.strategies.len());
        let mut state = DispatchState::Idle;
        tracing::debug!(state = ?state, fields = payload.field_count(), "dispatch starting");

        for (index, strategy) in self.strategies.iter().enumerate() {
            state = DispatchState::Trying(index + 1);
            tracing::info!(
                state = ?state,
                strategy = strategy.name().as_str(),
                "trying strategy"
            );
            let attempt = strategy.attempt(payload);
            let confirmed = attempt.is_confirmed();
            attempts.push(attempt);
            if confirmed {
                state = DispatchState::Succeeded(strategy.name());
                break;
            }
        }
        if !matches!(state, DispatchState::Succeeded(_)) {
            state = DispatchState::Exhausted;
        }
        tracing::info!(state = ?state, attempts = attempts.len(), "dispatch finished");
        aggregate(state, attempts)
    }
}

fn aggregate(state: DispatchState, attempts: Vec<StrategyAttempt>) -> SubmissionOutcome {
    if let DispatchState::Succeeded(strategy) = state {
        return SubmissionOutcome {
            success: true,
            confirmed: true,
            succeeding_strategy: Some(strategy),
            attempts,
            reason: None,
            issue: None,
        };
    }

    let best_signal = attempts
        .iter()
        .find(|attempt| attempt.verified == VerificationStatus::Undetermined)
        .map(|attempt| attempt.strategy);
    if let Some(strategy) = best_signal {
        return SubmissionOutcome {
            success: true,
            confirmed: false,
            succeeding_strategy: Some(strategy),
            attempts,
            reason: Some(REASON_UNCONFIRMED.to_string()),
            issue: Some(DeliveryIssue::VerificationAmbiguous),
        };
    }

    let issue = attempts.last().and_then(|attempt| attempt.issue);
    SubmissionOutcome {
        success: false,
        confirmed: false,
        succeeding_strategy: None,
        attempts,
        reason: Some(REASON_ALL_FAILED.to_string()),
        issue,
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
