//! Scripted collaborators for strategy and dispatcher tests.
use super::StrategyContext;
use crate::handoff::{HandoffBlocked, Launcher};
use crate::payload::{PayloadBuilder, SubmissionPayload, EMPLOYEE_NAME_KEY};
use crate::transport::{FormTransport, HttpReply, ResponseMode, TransportFailure};
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

pub const FORM_URL: &str = "http://form.test/d/e/abc/formResponse";

pub fn payload(name: &str) -> SubmissionPayload {
    PayloadBuilder::new(BTreeMap::from([(
        EMPLOYEE_NAME_KEY.to_string(),
        "entry.1001".to_string(),
    )]))
    .build(&BTreeMap::from([(EMPLOYEE_NAME_KEY.to_string(), name.to_string())]))
}

/// Replies to calls in order; records each call as `METHOD url [mode]`.
pub struct ScriptedTransport {
    replies: RefCell<VecDeque<Result<HttpReply, TransportFailure>>>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Result<HttpReply, TransportFailure>>) -> Rc<Self> {
        Rc::new(Self {
            replies: RefCell::new(replies.into()),
            calls: RefCell::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn next(&self) -> Result<HttpReply, TransportFailure> {
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(TransportFailure::transport("script exhausted")))
    }
}

impl FormTransport for ScriptedTransport {
    fn post_form(
        &self,
        url: &str,
        _payload: &SubmissionPayload,
        mode: ResponseMode,
    ) -> Result<HttpReply, TransportFailure> {
        self.calls
            .borrow_mut()
            .push(format!("POST {url} {mode:?}"));
        let reply = self.next()?;
        Ok(match mode {
            ResponseMode::Opaque => HttpReply::opaque(),
            ResponseMode::Readable => reply,
        })
    }

    fn get(&self, url: &str) -> Result<HttpReply, TransportFailure> {
        self.calls.borrow_mut().push(format!("GET {url}"));
        self.next()
    }
}

/// Records opened URLs; blocks every open when `blocked` is set.
pub struct RecordingLauncher {
    blocked: Option<String>,
    opened: RefCell<Vec<String>>,
}

impl RecordingLauncher {
    pub fn allowing() -> Rc<Self> {
        Rc::new(Self {
            blocked: None,
            opened: RefCell::new(Vec::new()),
        })
    }

    pub fn blocking(reason: &str) -> Rc<Self> {
        Rc::new(Self {
            blocked: Some(reason.to_string()),
            opened: RefCell::new(Vec::new()),
        })
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.borrow().clone()
    }
}

impl Launcher for RecordingLauncher {
    fn open(&self, url: &str) -> Result<(), HandoffBlocked> {
        if let Some(reason) = &self.blocked {
            return Err(HandoffBlocked::new(reason.clone()));
        }
        self.opened.borrow_mut().push(url.to_string());
        Ok(())
    }
}

pub fn context(
    transport: Rc<ScriptedTransport>,
    launcher: Rc<RecordingLauncher>,
    surface_root: &Path,
) -> StrategyContext {
    StrategyContext {
        form_url: FORM_URL.to_string(),
        transport,
        launcher,
        settle_delay: Duration::ZERO,
        surface_root: Some(surface_root.to_path_buf()),
    }
}
