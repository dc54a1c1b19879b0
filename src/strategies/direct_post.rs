use super::{StrategyContext, TransportStrategy};
use crate::attempt::{AttemptTimer, RawSignal, StrategyAttempt, StrategyName};
use crate::payload::SubmissionPayload;
use crate::transport::{FormTransport, ResponseMode};
use std::rc::Rc;

/// Opaque form POST. Completion only proves the request left the client.
pub struct DirectPost {
    form_url: String,
    transport: Rc<dyn FormTransport>,
}

impl DirectPost {
    pub fn new(form_url: impl Into<String>, transport: Rc<dyn FormTransport>) -> Self {
        Self {
            form_url: form_url.into(),
            transport,
        }
    }

    pub(super) fn boxed(ctx: &StrategyContext) -> Box<dyn TransportStrategy> {
        Box::new(Self::new(ctx.form_url.clone(), Rc::clone(&ctx.transport)))
    }
}

impl TransportStrategy for DirectPost {
    fn name(&self) -> StrategyName {
        StrategyName::DirectPost
    }

    fn attempt(&self, payload: &SubmissionPayload) -> StrategyAttempt {
        let timer = AttemptTimer::start(self.name());
        match self
            .transport
            .post_form(&self.form_url, payload, ResponseMode::Opaque)
        {
            Ok(_) => timer.undetermined(Some(RawSignal::Opaque)),
            Err(failure) => timer.refuted(None, failure.issue(), failure.to_string()),
        }
    }
}
