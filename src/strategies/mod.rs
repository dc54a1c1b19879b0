//! Transport strategies and the ordered strategy table.
//!
//! Each strategy delivers the payload through a different mechanism and
//! converts every failure into a `StrategyAttempt`; nothing here returns an
//! error to the dispatcher.
use crate::attempt::{StrategyAttempt, StrategyName};
use crate::handoff::Launcher;
use crate::payload::SubmissionPayload;
use crate::probe::VerificationProber;
use crate::transport::FormTransport;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

mod direct_post;
mod hidden_frame;
mod redirect_handoff;
mod verified_post;

pub use direct_post::DirectPost;
pub use hidden_frame::HiddenFramePost;
pub use redirect_handoff::RedirectHandoff;
pub use verified_post::VerifiedPost;

pub trait TransportStrategy {
    fn name(&self) -> StrategyName;
    fn attempt(&self, payload: &SubmissionPayload) -> StrategyAttempt;
}

/// Collaborators shared by the strategies of one submission.
#[derive(Clone)]
pub struct StrategyContext {
    pub form_url: String,
    pub transport: Rc<dyn FormTransport>,
    pub launcher: Rc<dyn Launcher>,
    pub settle_delay: Duration,
    pub surface_root: Option<PathBuf>,
}

impl StrategyContext {
    pub fn prober(&self) -> VerificationProber {
        VerificationProber::new(Rc::clone(&self.transport), self.form_url.clone())
    }
}

pub struct StrategyDescriptor {
    pub name: StrategyName,
    pub build: fn(&StrategyContext) -> Box<dyn TransportStrategy>,
}

/// Fixed priority order: fast opaque delivery first, then progressively
/// more certain mechanisms, then handoff to a human.
pub const STRATEGY_TABLE: [StrategyDescriptor; 4] = [
    StrategyDescriptor {
        name: StrategyName::DirectPost,
        build: DirectPost::boxed,
    },
    StrategyDescriptor {
        name: StrategyName::HiddenFramePost,
        build: HiddenFramePost::boxed,
    },
    StrategyDescriptor {
        name: StrategyName::VerifiedPost,
        build: VerifiedPost::boxed,
    },
    StrategyDescriptor {
        name: StrategyName::RedirectHandoff,
        build: RedirectHandoff::boxed,
    },
];

pub fn build_strategies(ctx: &StrategyContext) -> Vec<Box<dyn TransportStrategy>> {
    STRATEGY_TABLE
        .iter()
        .map(|descriptor| {
            let strategy = (descriptor.build)(ctx);
            debug_assert_eq!(strategy.name(), descriptor.name);
            strategy
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod testing;
