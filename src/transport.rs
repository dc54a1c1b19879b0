//! HTTP seam used by every network-facing strategy.
//!
//! `ResponseMode::Opaque` mirrors a cross-origin `no-cors` request: the call
//! either completes or raises, and nothing about the response is surfaced.
use crate::attempt::DeliveryIssue;
use crate::payload::SubmissionPayload;
use std::fmt;
use std::time::{Duration, Instant};

pub const DEFAULT_USER_AGENT: &str = concat!("review-submit/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    Opaque,
    Readable,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpReply {
    pub status: Option<u16>,
    pub body: Option<String>,
}

impl HttpReply {
    pub fn opaque() -> Self {
        Self::default()
    }

    pub fn readable(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body: Some(body.into()),
        }
    }

    pub fn text(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl TransportFailure {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transport,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Timeout,
            message: message.into(),
        }
    }

    pub fn issue(&self) -> DeliveryIssue {
        match self.kind {
            FailureKind::Transport => DeliveryIssue::Transport,
            FailureKind::Timeout => DeliveryIssue::Timeout,
        }
    }
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FailureKind::Transport => write!(f, "transport error: {}", self.message),
            FailureKind::Timeout => write!(f, "timed out: {}", self.message),
        }
    }
}

impl std::error::Error for TransportFailure {}

pub trait FormTransport {
    /// POST the payload as `application/x-www-form-urlencoded`.
    fn post_form(
        &self,
        url: &str,
        payload: &SubmissionPayload,
        mode: ResponseMode,
    ) -> Result<HttpReply, TransportFailure>;

    /// Body-less GET; always readable.
    fn get(&self, url: &str) -> Result<HttpReply, TransportFailure>;
}

/// Blocking `ureq` transport with one global timeout ceiling per request.
pub struct UreqTransport {
    agent: ureq::Agent,
    user_agent: String,
}

impl UreqTransport {
    pub fn new(timeout: Duration, user_agent: Option<&str>) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            user_agent: user_agent.unwrap_or(DEFAULT_USER_AGENT).to_string(),
        }
    }
}

impl FormTransport for UreqTransport {
    fn post_form(
        &self,
        url: &str,
        payload: &SubmissionPayload,
        mode: ResponseMode,
    ) -> Result<HttpReply, TransportFailure> {
        let start = Instant::now();
        let mut response = self
            .agent
            .post(url)
            .header("User-Agent", self.user_agent.as_str())
            .send_form(payload.fields())
            .map_err(failure_from_ureq)?;
        let reply = match mode {
            ResponseMode::Opaque => HttpReply::opaque(),
            ResponseMode::Readable => {
                let status = response.status().as_u16();
                let body = response
                    .body_mut()
                    .read_to_string()
                    .map_err(failure_from_ureq)?;
                HttpReply::readable(status, body)
            }
        };
        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            mode = ?mode,
            fields = payload.field_count(),
            response_bytes = reply.text().len(),
            "form post complete"
        );
        Ok(reply)
    }

    fn get(&self, url: &str) -> Result<HttpReply, TransportFailure> {
        let start = Instant::now();
        let mut response = self
            .agent
            .get(url)
            .header("User-Agent", self.user_agent.as_str())
            .call()
            .map_err(failure_from_ureq)?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(failure_from_ureq)?;
        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            status,
            response_bytes = body.len(),
            "probe get complete"
        );
        Ok(HttpReply::readable(status, body))
    }
}

fn failure_from_ureq(err: ureq::Error) -> TransportFailure {
    match err {
        ureq::Error::Timeout(which) => TransportFailure::timeout(format!("{which:?} timeout")),
        ureq::Error::Io(io) if io.kind() == std::io::ErrorKind::TimedOut => {
            TransportFailure::timeout(io.to_string())
        }
        other => TransportFailure::transport(other.to_string()),
    }
}
