use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::collections::BTreeMap;
use std::io::{self, Read};
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

mod attempt;
mod cli;
mod config;
mod dispatch;
mod handoff;
mod markers;
mod payload;
mod probe;
mod report;
mod strategies;
mod surface;
mod transport;
mod util;

use cli::{Command, InitArgs, MarkersArgs, PreviewArgs, RootArgs, SubmitArgs, TargetArgs};
use config::SubmitConfig;
use dispatch::Dispatcher;
use handoff::{DisabledLauncher, Launcher, SystemLauncher};
use payload::{PayloadBuilder, SubmissionPayload, EMPLOYEE_NAME_KEY};
use report::{JsonReporter, OutcomeReporter, TextReporter};
use strategies::StrategyContext;
use transport::UreqTransport;

const LOG_ENV: &str = "REVIEW_SUBMIT_LOG";

fn main() -> Result<()> {
    let args = RootArgs::parse();
    let verbose = matches!(&args.command, Command::Submit(submit) if submit.verbose);
    init_tracing(verbose);

    match args.command {
        Command::Init(args) => run_init(args),
        Command::Preview(args) => run_preview(args),
        Command::Submit(args) => run_submit(args),
        Command::Markers(args) => run_markers(args),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run_init(args: InitArgs) -> Result<()> {
    config::write_config(&args.config, args.force)?;
    println!("wrote {}", args.config.display());
    Ok(())
}

fn run_preview(args: PreviewArgs) -> Result<()> {
    let config = resolve_config(&args.target, None, None)?;
    let payload = build_payload(&config, &args.target)?;
    let link = handoff::prefill_url(&config.form_url, &payload)?;

    if args.json {
        let fields: Vec<_> = payload
            .fields()
            .map(|(name, value)| serde_json::json!({ "name": name, "value": value }))
            .collect();
        let preview = serde_json::json!({
            "form_url": config.form_url,
            "fields": fields,
            "prefill_url": link.as_str(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&preview).context("serialize preview")?
        );
        return Ok(());
    }
    println!("form_url: {}", config.form_url);
    for (name, value) in payload.fields() {
        println!("  {name}={value}");
    }
    println!("prefill_url: {link}");
    Ok(())
}

fn run_submit(args: SubmitArgs) -> Result<()> {
    let config = resolve_config(&args.target, args.settle_ms, args.timeout_ms)?;
    let payload = build_payload(&config, &args.target)?;

    let launcher: Rc<dyn Launcher> = if args.no_handoff {
        Rc::new(DisabledLauncher::new("handoff disabled"))
    } else {
        match SystemLauncher::resolve(config.launcher_command.as_deref()) {
            Ok(launcher) => Rc::new(launcher),
            Err(err) => Rc::new(DisabledLauncher::new(format!("{err:#}"))),
        }
    };
    let ctx = StrategyContext {
        form_url: config.form_url.clone(),
        transport: Rc::new(UreqTransport::new(
            config.request_timeout(),
            config.user_agent.as_deref(),
        )),
        launcher,
        settle_delay: config.settle_delay(),
        surface_root: config.surface_dir.clone(),
    };
    let dispatcher = Dispatcher::standard(&ctx)?;
    tracing::debug!(strategies = ?dispatcher.strategy_names(), "dispatcher ready");
    let outcome = dispatcher.dispatch(&payload);

    let stdout = io::stdout();
    if args.json {
        JsonReporter::new(stdout.lock()).report(&outcome)?;
    } else {
        TextReporter::new(stdout.lock()).report(&outcome)?;
    }
    if let Some(out) = &args.out {
        util::write_json(out, &outcome)?;
    }
    if !outcome.success {
        return Err(anyhow!(
            "submission failed: {}",
            outcome.reason.as_deref().unwrap_or("unknown reason")
        ));
    }
    Ok(())
}

fn run_markers(args: MarkersArgs) -> Result<()> {
    let text = match &args.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?,
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("read stdin")?;
            text
        }
    };
    match markers::find_success_marker(&text) {
        Some(marker) => {
            println!("matched: {marker}");
            Ok(())
        }
        None => Err(anyhow!("no success marker found")),
    }
}

fn resolve_config(
    target: &TargetArgs,
    settle_ms: Option<u64>,
    timeout_ms: Option<u64>,
) -> Result<SubmitConfig> {
    let mut config = match config::resolve_config_path(target.config.as_deref()) {
        Some(path) => config::load_config(&path)?,
        None => config::default_config(),
    };
    config::apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    if let Some(url) = &target.form_url {
        config.form_url = url.clone();
    }
    if let Some(id) = &target.employee_field {
        config
            .fields
            .insert(EMPLOYEE_NAME_KEY.to_string(), id.clone());
    }
    if let Some(ms) = settle_ms {
        config.settle_delay_ms = ms;
    }
    if let Some(ms) = timeout_ms {
        config.request_timeout_ms = ms;
    }
    config::validate_config(&config)?;
    Ok(config)
}

fn build_payload(config: &SubmitConfig, target: &TargetArgs) -> Result<SubmissionPayload> {
    let employee = target.employee.trim();
    if employee.is_empty() {
        return Err(anyhow!("--employee must not be empty"));
    }
    let mut values: BTreeMap<String, String> = target.fields.iter().cloned().collect();
    values.insert(EMPLOYEE_NAME_KEY.to_string(), employee.to_string());
    for key in values.keys() {
        if !config.fields.contains_key(key) {
            return Err(anyhow!("no wire id configured for field {key:?}"));
        }
    }
    Ok(PayloadBuilder::new(config.fields.clone()).build(&values))
}
