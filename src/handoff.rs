//! Prefilled deep links and the browsing-context launcher for manual handoff.
use crate::payload::SubmissionPayload;
use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use url::Url;

/// Openers tried in order when no launcher command is configured.
#[cfg(target_os = "macos")]
const DEFAULT_OPENERS: &[&str] = &["open", "xdg-open"];
/// Openers tried in order when no launcher command is configured. `open` is
/// left out because on Linux it is usually `openvt`.
#[cfg(not(target_os = "macos"))]
const DEFAULT_OPENERS: &[&str] = &["xdg-open", "wslview"];

/// How long an opener may take to fail before the context counts as opened.
const EARLY_EXIT_WINDOW: Duration = Duration::from_millis(300);
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Build `form_url` with the payload's domain fields as query parameters.
pub fn prefill_url(form_url: &str, payload: &SubmissionPayload) -> Result<Url> {
    let mut url = Url::parse(form_url).with_context(|| format!("parse form url {form_url}"))?;
    {
        let mut query = url.query_pairs_mut();
        for (key, value) in payload.prefill_pairs() {
            query.append_pair(key, value);
        }
    }
    Ok(url)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffBlocked {
    pub reason: String,
}

impl HandoffBlocked {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for HandoffBlocked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handoff blocked: {}", self.reason)
    }
}

impl std::error::Error for HandoffBlocked {}

/// Opens a URL in a new browsing context for the operator.
pub trait Launcher {
    fn open(&self, url: &str) -> Result<(), HandoffBlocked>;
}

/// Launches the desktop browser through an opener program.
#[derive(Debug, Clone)]
pub struct SystemLauncher {
    argv: Vec<String>,
}

impl SystemLauncher {
    /// Use `command` (shell-words syntax) or the first default opener on PATH.
    pub fn resolve(command: Option<&str>) -> Result<Self> {
        if let Some(raw) = command {
            let argv = shell_words::split(raw).context("parse launcher_command")?;
            if argv.is_empty() {
                return Err(anyhow!("launcher_command is empty"));
            }
            return Ok(Self { argv });
        }
        let program = DEFAULT_OPENERS
            .iter()
            .find_map(|name| which::which(name).ok())
            .ok_or_else(|| {
                anyhow!(
                    "no browser opener found (tried {})",
                    DEFAULT_OPENERS.join(", ")
                )
            })?;
        Ok(Self::from_program(program))
    }

    fn from_program(program: PathBuf) -> Self {
        Self {
            argv: vec![program.display().to_string()],
        }
    }
}

impl Launcher for SystemLauncher {
    fn open(&self, url: &str) -> Result<(), HandoffBlocked> {
        let Some((program, args)) = self.argv.split_first() else {
            return Err(HandoffBlocked::new("launcher command is empty"));
        };
        let mut child = Command::new(program)
            .args(args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| HandoffBlocked::new(format!("spawn {program}: {err}")))?;

        // A browser may keep running for the whole session; only an early
        // failure blocks the handoff.
        let deadline = Instant::now() + EARLY_EXIT_WINDOW;
        loop {
            match child.try_wait() {
                Ok(Some(status)) if status.success() => break,
                Ok(Some(status)) => {
                    return Err(HandoffBlocked::new(format!("{program} exited with {status}")));
                }
                Ok(None) if Instant::now() >= deadline => {
                    tracing::debug!(program = program.as_str(), "opener still running; detached");
                    break;
                }
                Ok(None) => thread::sleep(EXIT_POLL_INTERVAL),
                Err(err) => {
                    return Err(HandoffBlocked::new(format!("wait for {program}: {err}")));
                }
            }
        }
        tracing::info!(program = program.as_str(), "handoff context opened");
        Ok(())
    }
}

/// Launcher used when no browser may be opened.
#[derive(Debug, Clone)]
pub struct DisabledLauncher {
    reason: String,
}

impl DisabledLauncher {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Launcher for DisabledLauncher {
    fn open(&self, _url: &str) -> Result<(), HandoffBlocked> {
        Err(HandoffBlocked::new(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{PayloadBuilder, EMPLOYEE_NAME_KEY};
    use std::collections::BTreeMap;

    fn payload() -> SubmissionPayload {
        PayloadBuilder::new(BTreeMap::from([(
            EMPLOYEE_NAME_KEY.to_string(),
            "entry.99".to_string(),
        )]))
        .build(&BTreeMap::from([(
            EMPLOYEE_NAME_KEY.to_string(),
            "Zoë & Co".to_string(),
        )]))
    }

    #[test]
    fn prefill_url_carries_only_domain_fields() {
        let url = prefill_url("https://forms.test/d/e/abc/formResponse", &payload())
            .expect("prefill url");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![("entry.99".to_string(), "Zoë & Co".to_string())]);
        assert_eq!(url.path(), "/d/e/abc/formResponse");
    }

    #[test]
    fn prefill_url_keeps_existing_query() {
        let url = prefill_url("https://forms.test/viewform?usp=pp_url", &payload())
            .expect("prefill url");
        let keys: Vec<String> = url.query_pairs().map(|(key, _)| key.into_owned()).collect();
        assert_eq!(keys, vec!["usp".to_string(), "entry.99".to_string()]);
    }

    #[test]
    fn disabled_launcher_always_blocks() {
        let blocked = DisabledLauncher::new("handoff disabled")
            .open("https://forms.test")
            .expect_err("blocked");
        assert_eq!(blocked.reason, "handoff disabled");
    }

    #[test]
    fn configured_command_opens_when_it_succeeds() {
        if which::which("true").is_err() {
            return;
        }
        let launcher = SystemLauncher::resolve(Some("true --ignored")).expect("resolve");
        assert!(launcher.open("https://forms.test").is_ok());
    }

    #[test]
    fn failing_command_is_blocked() {
        if which::which("false").is_err() {
            return;
        }
        let launcher = SystemLauncher::resolve(Some("false")).expect("resolve");
        assert!(launcher.open("https://forms.test").is_err());
    }

    #[test]
    fn long_running_opener_counts_as_opened() {
        if which::which("sh").is_err() {
            return;
        }
        let launcher = SystemLauncher::resolve(Some("sh -c 'sleep 4' sh")).expect("resolve");
        let start = Instant::now();
        assert!(launcher.open("https://forms.test").is_ok());
        assert!(
            start.elapsed() < Duration::from_secs(2),
            "open waited {:?} for the opener to exit",
            start.elapsed()
        );
    }

    #[test]
    fn early_failing_opener_is_blocked() {
        if which::which("sh").is_err() {
            return;
        }
        let launcher = SystemLauncher::resolve(Some("sh -c 'exit 3' sh")).expect("resolve");
        let blocked = launcher.open("https://forms.test").expect_err("blocked");
        assert!(blocked.reason.contains("exited with"));
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn default_openers_skip_console_open() {
        assert!(!DEFAULT_OPENERS.contains(&"open"));
        assert_eq!(DEFAULT_OPENERS.first(), Some(&"xdg-open"));
    }

    #[test]
    fn missing_program_is_blocked() {
        let launcher =
            SystemLauncher::resolve(Some("review-submit-no-such-opener")).expect("resolve");
        let blocked = launcher.open("https://forms.test").expect_err("blocked");
        assert!(blocked.reason.contains("review-submit-no-such-opener"));
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(SystemLauncher::resolve(Some("   ")).is_err());
    }
}
