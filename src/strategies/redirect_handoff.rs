use super::{StrategyContext, TransportStrategy};
use crate::attempt::{AttemptTimer, DeliveryIssue, RawSignal, StrategyAttempt, StrategyName};
use crate::handoff::{prefill_url, Launcher};
use crate::payload::SubmissionPayload;
use std::rc::Rc;

/// Last resort: open a prefilled form for the operator to submit by hand.
///
/// Opening the context is the only observable signal, so success here is
/// optimistic.
pub struct RedirectHandoff {
    form_url: String,
    launcher: Rc<dyn Launcher>,
}

impl RedirectHandoff {
    pub fn new(form_url: impl Into<String>, launcher: Rc<dyn Launcher>) -> Self {
        Self {
            form_url: form_url.into(),
            launcher,
        }
    }

    pub(super) fn boxed(ctx: &StrategyContext) -> Box<dyn TransportStrategy> {
        Box::new(Self::new(ctx.form_url.clone(), Rc::clone(&ctx.launcher)))
    }
}

impl TransportStrategy for RedirectHandoff {
    fn name(&self) -> StrategyName {
        StrategyName::RedirectHandoff
    }

    fn attempt(&self, payload: &SubmissionPayload) -> StrategyAttempt {
        let timer = AttemptTimer::start(self.name());
        let url = match prefill_url(&self.form_url, payload) {
            Ok(url) => url,
            Err(err) => {
                return timer.refuted(
                    Some(RawSignal::ContextBlocked),
                    DeliveryIssue::HandoffBlocked,
                    format!("{err:#}"),
                );
            }
        };
        match self.launcher.open(url.as_str()) {
            Ok(()) => timer.confirmed(Some(RawSignal::ContextOpened)),
            Err(blocked) => {
                tracing::warn!(url = url.as_str(), "{blocked}");
                timer.refuted(
                    Some(RawSignal::ContextBlocked),
                    DeliveryIssue::HandoffBlocked,
                    blocked.to_string(),
                )
            }
        }
    }
}
