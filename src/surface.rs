//! Off-screen rendering surface for the hidden-frame strategy.
//!
//! A surface is a private scratch directory that holds the staged form
//! scaffolding and whatever document the post loads into it. It is owned by a
//! single attempt and removed when released or dropped, whichever comes
//! first.
use crate::payload::SubmissionPayload;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SURFACE_PREFIX: &str = "review-submit-frame-";
const FORM_FILE: &str = "form.html";
const DOCUMENT_FILE: &str = "document.html";

#[derive(Debug)]
pub struct OffscreenSurface {
    dir: Option<TempDir>,
}

impl OffscreenSurface {
    /// Create a fresh surface under `root`, or the system temp dir.
    pub fn acquire(root: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SURFACE_PREFIX);
        let dir = match root {
            Some(root) => builder
                .tempdir_in(root)
                .with_context(|| format!("create surface in {}", root.display()))?,
            None => builder.tempdir().context("create surface")?,
        };
        tracing::debug!(path = %dir.path().display(), "surface acquired");
        Ok(Self { dir: Some(dir) })
    }

    pub fn path(&self) -> Option<&Path> {
        self.dir.as_ref().map(TempDir::path)
    }

    /// Write the auto-submitting form scaffolding targeting `action`.
    pub fn stage_form(&self, action: &str, payload: &SubmissionPayload) -> Result<PathBuf> {
        let path = self.file(FORM_FILE)?;
        let mut html = String::new();
        html.push_str("<!doctype html>\n<html><body>\n");
        html.push_str(&format!(
            "<form method=\"POST\" action=\"{}\" target=\"_self\">\n",
            escape_attr(action)
        ));
        for (name, value) in payload.fields() {
            html.push_str(&format!(
                "  <input type=\"hidden\" name=\"{}\" value=\"{}\">\n",
                escape_attr(name),
                escape_attr(value)
            ));
        }
        html.push_str("</form>\n</body></html>\n");
        fs::write(&path, html).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    /// Load the document returned by the post into the surface.
    pub fn load_document(&self, body: &str) -> Result<PathBuf> {
        let path = self.file(DOCUMENT_FILE)?;
        fs::write(&path, body).with_context(|| format!("write {}", path.display()))?;
        tracing::debug!(bytes = body.len(), "surface document loaded");
        Ok(path)
    }

    /// Tear the surface down, reporting removal errors.
    pub fn release(mut self) -> Result<()> {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            dir.close()
                .with_context(|| format!("remove surface {}", path.display()))?;
            tracing::debug!(path = %path.display(), "surface released");
        }
        Ok(())
    }

    fn file(&self, name: &str) -> Result<PathBuf> {
        self.path()
            .map(|dir| dir.join(name))
            .ok_or_else(|| anyhow!("surface already released"))
    }
}

impl Drop for OffscreenSurface {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            drop(dir);
            tracing::debug!(path = %path.display(), "surface dropped");
        }
    }
}

fn escape_attr(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}
