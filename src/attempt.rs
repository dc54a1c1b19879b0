//! Attempt records produced by transport strategies.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyName {
    DirectPost,
    HiddenFramePost,
    VerifiedPost,
    RedirectHandoff,
}

impl StrategyName {
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyName::DirectPost => "direct_post",
            StrategyName::HiddenFramePost => "hidden_frame_post",
            StrategyName::VerifiedPost => "verified_post",
            StrategyName::RedirectHandoff => "redirect_handoff",
        }
    }
}

impl fmt::Display for StrategyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ternary delivery verdict. Opaque transports can only ever reach
/// `Undetermined`; it is kept distinct from `Refuted` all the way to the
/// reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Confirmed,
    Refuted,
    Undetermined,
}

impl VerificationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VerificationStatus::Confirmed => "confirmed",
            VerificationStatus::Refuted => "refuted",
            VerificationStatus::Undetermined => "undetermined",
        }
    }
}

/// Delivery error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryIssue {
    /// Network failure raised by the HTTP client.
    Transport,
    /// Request exceeded the fixed ceiling.
    Timeout,
    /// Request completed but delivery could not be confirmed.
    VerificationAmbiguous,
    /// The handoff browsing context could not be opened.
    HandoffBlocked,
}

impl DeliveryIssue {
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryIssue::Transport => "transport",
            DeliveryIssue::Timeout => "timeout",
            DeliveryIssue::VerificationAmbiguous => "verification_ambiguous",
            DeliveryIssue::HandoffBlocked => "handoff_blocked",
        }
    }
}

/// Raw diagnostic observed by a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawSignal {
    /// Request completed but the response could not be read.
    Opaque,
    Http { status: u16 },
    FrameLoaded { status: Option<u16> },
    ContextOpened,
    ContextBlocked,
}

impl fmt::Display for RawSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawSignal::Opaque => f.write_str("opaque"),
            RawSignal::Http { status } => write!(f, "http {status}"),
            RawSignal::FrameLoaded { status: Some(status) } => write!(f, "frame loaded ({status})"),
            RawSignal::FrameLoaded { status: None } => f.write_str("frame loaded"),
            RawSignal::ContextOpened => f.write_str("context opened"),
            RawSignal::ContextBlocked => f.write_str("context blocked"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyAttempt {
    pub strategy: StrategyName,
    pub started_at_ms: u64,
    pub finished_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_status: Option<RawSignal>,
    pub verified: VerificationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<DeliveryIssue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StrategyAttempt {
    pub fn duration_ms(&self) -> u64 {
        self.finished_at_ms.saturating_sub(self.started_at_ms)
    }

    pub fn is_confirmed(&self) -> bool {
        self.verified == VerificationStatus::Confirmed
    }
}

/// Open attempt; consumed exactly once to produce the final record.
#[derive(Debug)]
pub struct AttemptTimer {
    strategy: StrategyName,
    started_at_ms: u64,
}

impl AttemptTimer {
    pub fn start(strategy: StrategyName) -> Self {
        Self {
            strategy,
            started_at_ms: epoch_ms(),
        }
    }

    pub fn confirmed(self, raw_status: Option<RawSignal>) -> StrategyAttempt {
        self.finish(raw_status, VerificationStatus::Confirmed, None, None)
    }

    pub fn undetermined(self, raw_status: Option<RawSignal>) -> StrategyAttempt {
        self.finish(
            raw_status,
            VerificationStatus::Undetermined,
            Some(DeliveryIssue::VerificationAmbiguous),
            None,
        )
    }

    pub fn refuted(
        self,
        raw_status: Option<RawSignal>,
        issue: DeliveryIssue,
        error: impl Into<String>,
    ) -> StrategyAttempt {
        self.finish(
            raw_status,
            VerificationStatus::Refuted,
            Some(issue),
            Some(error.into()),
        )
    }

    fn finish(
        self,
        raw_status: Option<RawSignal>,
        verified: VerificationStatus,
        issue: Option<DeliveryIssue>,
        error: Option<String>,
    ) -> StrategyAttempt {
        let finished_at_ms = epoch_ms().max(self.started_at_ms);
        tracing::info!(
            strategy = self.strategy.as_str(),
            verified = verified.as_str(),
            elapsed_ms = finished_at_ms - self.started_at_ms,
            "strategy attempt finished"
        );
        StrategyAttempt {
            strategy: self.strategy,
            started_at_ms: self.started_at_ms,
            finished_at_ms,
            raw_status,
            verified,
            issue,
            error,
        }
    }
}

fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
