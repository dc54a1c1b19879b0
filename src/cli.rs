//! CLI argument parsing for review submission.
//!
//! The CLI only wires config, payload building and dispatch together; the
//! delivery policy lives in the dispatcher and its strategy table.
use crate::util::parse_key_value;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "review-submit",
    version,
    about = "Deliver employee-review submissions to an opaque survey endpoint",
    after_help = "Commands:\n  init --config <path>          Write a config stub to edit\n  preview --employee <name>     Show the payload and prefilled link without sending\n  submit --employee <name>      Deliver the submission using every strategy in order\n  markers [--file <path>]       Check saved response HTML for success markers\n\nExamples:\n  review-submit init --config ~/.config/review-submit/config.json\n  review-submit preview --employee \"Ada Lovelace\"\n  review-submit submit --employee \"Ada Lovelace\" --json --out outcome.json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Init(InitArgs),
    Preview(PreviewArgs),
    Submit(SubmitArgs),
    Markers(MarkersArgs),
}

/// Endpoint selection and domain values shared by `preview` and `submit`.
#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Config file (defaults to $REVIEW_SUBMIT_CONFIG, then the user config dir)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the form response URL
    #[arg(long, value_name = "URL")]
    pub form_url: Option<String>,

    /// Override the wire id of the employee-name question
    #[arg(long, value_name = "ID")]
    pub employee_field: Option<String>,

    /// Name of the reviewed employee
    #[arg(long, value_name = "NAME")]
    pub employee: String,

    /// Additional domain value mapped through the config's field table
    #[arg(long = "field", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub fields: Vec<(String, String)>,
}

#[derive(Parser, Debug)]
#[command(about = "Write a config stub")]
pub struct InitArgs {
    /// Destination for the config stub
    #[arg(long, value_name = "PATH")]
    pub config: PathBuf,

    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Build the payload and prefilled link without sending anything")]
pub struct PreviewArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Deliver a submission, trying each strategy in priority order")]
pub struct SubmitArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Override the settle delay before the hidden-frame probe
    #[arg(long, value_name = "MS")]
    pub settle_ms: Option<u64>,

    /// Override the per-request timeout ceiling
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Never open a browser; the handoff strategy reports blocked
    #[arg(long)]
    pub no_handoff: bool,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,

    /// Also write the JSON outcome to this path
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Log strategy progress to stderr
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Check response text for success markers")]
pub struct MarkersArgs {
    /// File to scan (reads stdin when omitted)
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}
