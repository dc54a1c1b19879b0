//! Submission configuration.
//!
//! The config names the survey endpoint and the wire ids of its questions;
//! everything else has a default. Values resolve from the config file, then
//! environment overrides, then CLI flags.
use crate::payload::{is_auxiliary_field, EMPLOYEE_NAME_KEY};
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_SCHEMA_VERSION: u32 = 1;
pub const CONFIG_ENV: &str = "REVIEW_SUBMIT_CONFIG";
pub const FORM_URL_ENV: &str = "REVIEW_SUBMIT_FORM_URL";
const CONFIG_DIR_NAME: &str = "review-submit";
const CONFIG_FILE_NAME: &str = "config.json";

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_SETTLE_DELAY_MS: u64 = 3_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitConfig {
    pub schema_version: u32,
    /// Form response endpoint, e.g. `https://docs.google.com/forms/d/e/<id>/formResponse`.
    pub form_url: String,
    /// Domain key to wire field id.
    pub fields: BTreeMap<String, String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub launcher_command: Option<String>,
    #[serde(default)]
    pub surface_dir: Option<PathBuf>,
}

impl SubmitConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

fn default_settle_delay_ms() -> u64 {
    DEFAULT_SETTLE_DELAY_MS
}

/// Config used when no file is found; needs a form URL and field id.
pub fn default_config() -> SubmitConfig {
    SubmitConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        form_url: String::new(),
        fields: BTreeMap::new(),
        request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
        user_agent: None,
        launcher_command: None,
        surface_dir: None,
    }
}

/// Render a pretty JSON config stub for `init`.
pub fn config_stub() -> Result<String> {
    let mut config = default_config();
    config.form_url = "https://docs.google.com/forms/d/e/<form-id>/formResponse".to_string();
    config
        .fields
        .insert(EMPLOYEE_NAME_KEY.to_string(), "entry.<question-id>".to_string());
    serde_json::to_string_pretty(&config).context("serialize config stub")
}

/// Write the config stub to `path`; refuses to replace an existing file
/// unless `force` is set.
pub fn write_config(path: &Path, force: bool) -> Result<()> {
    if path.is_file() && !force {
        return Err(anyhow!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        ));
    }
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, config_stub()?).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn load_config(path: &Path) -> Result<SubmitConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: SubmitConfig =
        serde_json::from_slice(&bytes).with_context(|| format!("parse config {}", path.display()))?;
    Ok(config)
}

/// Locate the config file: explicit path, `REVIEW_SUBMIT_CONFIG`, then the
/// per-user config dir when the file exists there.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env::var_os(CONFIG_ENV).filter(|value| !value.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file())
}

/// Apply environment overrides through `lookup` so tests avoid process env.
pub fn apply_env_overrides<F>(config: &mut SubmitConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(FORM_URL_ENV).filter(|value| !value.trim().is_empty()) {
        config.form_url = url.trim().to_string();
    }
}

pub fn validate_config(config: &SubmitConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            config.schema_version
        ));
    }
    if config.form_url.trim().is_empty() {
        return Err(anyhow!(
            "form_url must be set (config file, {FORM_URL_ENV} or --form-url)"
        ));
    }
    let url = url::Url::parse(&config.form_url)
        .with_context(|| format!("form_url is not a valid URL ({:?})", config.form_url))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(anyhow!(
            "form_url must use http or https (got {:?})",
            url.scheme()
        ));
    }
    if !config.fields.contains_key(EMPLOYEE_NAME_KEY) {
        return Err(anyhow!(
            "fields must map {EMPLOYEE_NAME_KEY:?} (config file or --employee-field)"
        ));
    }
    let wire_id = Regex::new(r"^[A-Za-z0-9_.-]+$").context("compile wire id pattern")?;
    for (key, id) in &config.fields {
        if !wire_id.is_match(id) {
            return Err(anyhow!("field {key:?} has invalid wire id {id:?}"));
        }
        if is_auxiliary_field(id) {
            return Err(anyhow!(
                "field {key:?} maps to reserved wire id {id:?}"
            ));
        }
    }
    if config.request_timeout_ms == 0 {
        return Err(anyhow!("request_timeout_ms must be positive"));
    }
    if let Some(command) = config.launcher_command.as_deref() {
        let argv = shell_words::split(command).context("parse launcher_command")?;
        if argv.is_empty() {
            return Err(anyhow!("launcher_command must be non-empty when set"));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
