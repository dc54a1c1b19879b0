use super::{StrategyContext, TransportStrategy};
use crate::attempt::{AttemptTimer, DeliveryIssue, RawSignal, StrategyAttempt, StrategyName};
use crate::payload::SubmissionPayload;
use crate::probe::VerificationProber;
use crate::surface::OffscreenSurface;
use crate::transport::{FormTransport, ResponseMode};
use std::path::PathBuf;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

/// Posts the form into an off-screen surface, then probes after a settle
/// delay. The loaded document stays inside the surface; only the prober may
/// upgrade the verdict.
pub struct HiddenFramePost {
    form_url: String,
    transport: Rc<dyn FormTransport>,
    prober: VerificationProber,
    settle_delay: Duration,
    surface_root: Option<PathBuf>,
}

impl HiddenFramePost {
    pub fn new(ctx: &StrategyContext) -> Self {
        Self {
            form_url: ctx.form_url.clone(),
            transport: Rc::clone(&ctx.transport),
            prober: ctx.prober(),
            settle_delay: ctx.settle_delay,
            surface_root: ctx.surface_root.clone(),
        }
    }

    pub(super) fn boxed(ctx: &StrategyContext) -> Box<dyn TransportStrategy> {
        Box::new(Self::new(ctx))
    }

    fn post_through(
        &self,
        surface: &OffscreenSurface,
        payload: &SubmissionPayload,
        timer: AttemptTimer,
    ) -> StrategyAttempt {
        if let Err(err) = surface.stage_form(&self.form_url, payload) {
            return timer.refuted(None, DeliveryIssue::Transport, format!("{err:#}"));
        }
        let reply = match self
            .transport
            .post_form(&self.form_url, payload, ResponseMode::Readable)
        {
            Ok(reply) => reply,
            Err(failure) => return timer.refuted(None, failure.issue(), failure.to_string()),
        };
        let raw = Some(RawSignal::FrameLoaded {
            status: reply.status,
        });
        if let Err(err) = surface.load_document(reply.text()) {
            tracing::warn!(error = %format!("{err:#}"), "surface document not stored");
        }

        if !self.settle_delay.is_zero() {
            thread::sleep(self.settle_delay);
        }
        let report = self.prober.probe();
        tracing::debug!(probe_status = ?report.status, "hidden frame settled");
        if report.confirmed() {
            timer.confirmed(raw)
        } else {
            timer.undetermined(raw)
        }
    }
}

impl TransportStrategy for HiddenFramePost {
    fn name(&self) -> StrategyName {
        StrategyName::HiddenFramePost
    }

    fn attempt(&self, payload: &SubmissionPayload) -> StrategyAttempt {
        let timer = AttemptTimer::start(self.name());
        let surface = match OffscreenSurface::acquire(self.surface_root.as_deref()) {
            Ok(surface) => surface,
            Err(err) => {
                return timer.refuted(None, DeliveryIssue::Transport, format!("{err:#}"));
            }
        };
        let attempt = self.post_through(&surface, payload, timer);
        if let Err(err) = surface.release() {
            tracing::warn!(error = %format!("{err:#}"), "surface teardown failed");
        }
        attempt
    }
}
