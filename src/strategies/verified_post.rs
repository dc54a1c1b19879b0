use super::{StrategyContext, TransportStrategy};
use crate::attempt::{AttemptTimer, DeliveryIssue, RawSignal, StrategyAttempt, StrategyName};
use crate::markers::find_success_marker;
use crate::payload::SubmissionPayload;
use crate::probe::VerificationProber;
use crate::transport::{FormTransport, ResponseMode};
use crate::util::truncate_string;
use std::rc::Rc;

const EXCERPT_BYTES: usize = 160;

/// Readable POST cross-checked by the prober; both must agree.
pub struct VerifiedPost {
    form_url: String,
    transport: Rc<dyn FormTransport>,
    prober: VerificationProber,
}

impl VerifiedPost {
    pub fn new(ctx: &StrategyContext) -> Self {
        Self {
            form_url: ctx.form_url.clone(),
            transport: Rc::clone(&ctx.transport),
            prober: ctx.prober(),
        }
    }

    pub(super) fn boxed(ctx: &StrategyContext) -> Box<dyn TransportStrategy> {
        Box::new(Self::new(ctx))
    }
}

impl TransportStrategy for VerifiedPost {
    fn name(&self) -> StrategyName {
        StrategyName::VerifiedPost
    }

    fn attempt(&self, payload: &SubmissionPayload) -> StrategyAttempt {
        let timer = AttemptTimer::start(self.name());
        let reply = match self
            .transport
            .post_form(&self.form_url, payload, ResponseMode::Readable)
        {
            Ok(reply) => reply,
            Err(failure) => return timer.refuted(None, failure.issue(), failure.to_string()),
        };
        let raw = reply.status.map(|status| RawSignal::Http { status });
        let Some(marker) = find_success_marker(reply.text()) else {
            tracing::debug!(
                excerpt = truncate_string(reply.text(), EXCERPT_BYTES).as_str(),
                "no success marker in response"
            );
            return timer.refuted(
                raw,
                DeliveryIssue::VerificationAmbiguous,
                "no success marker in response",
            );
        };

        let report = self.prober.probe();
        if report.confirmed() {
            return timer.confirmed(raw);
        }
        let detail = match &report.failure {
            Some(failure) => format!("probe failed: {failure}"),
            None => "probe found no marker".to_string(),
        };
        timer.refuted(
            raw,
            DeliveryIssue::VerificationAmbiguous,
            format!("response matched {marker:?} but {detail}"),
        )
    }
}
