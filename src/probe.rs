//! Read-only verification probe against the survey endpoint.
use crate::markers::find_success_marker;
use crate::transport::{FormTransport, TransportFailure};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub status: Option<u16>,
    pub marker: Option<&'static str>,
    pub failure: Option<TransportFailure>,
}

impl ProbeReport {
    pub fn confirmed(&self) -> bool {
        self.marker.is_some()
    }
}

#[derive(Clone)]
pub struct VerificationProber {
    transport: Rc<dyn FormTransport>,
    url: String,
}

impl VerificationProber {
    pub fn new(transport: Rc<dyn FormTransport>, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
        }
    }

    /// GET the endpoint and scan the returned text for success markers.
    ///
    /// Probe failures never propagate; they only withhold confirmation.
    pub fn probe(&self) -> ProbeReport {
        match self.transport.get(&self.url) {
            Ok(reply) => {
                let marker = find_success_marker(reply.text());
                tracing::debug!(status = ?reply.status, marker = ?marker, "verification probe");
                ProbeReport {
                    status: reply.status,
                    marker,
                    failure: None,
                }
            }
            Err(failure) => {
                tracing::debug!(error = %failure, "verification probe failed");
                ProbeReport {
                    status: None,
                    marker: None,
                    failure: Some(failure),
                }
            }
        }
    }
}
