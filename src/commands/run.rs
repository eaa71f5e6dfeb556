use clap::Args;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use masquerade::config::ProjectConfig;
use masquerade::engine::{EngineClient, LexicalEngine};
use masquerade::progress::{CancelToken, StatusLineProgress};
use masquerade::refactor::{Anonymizer, RunOptions, RunReport, RunState};
use masquerade::source::DartParser;

use super::{CmdResult, ProjectArgs, SelectionArgs};

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Channel name to seed names with (overrides projectEncrypt.properties)
    #[arg(long)]
    pub seed: Option<String>,

    /// Scan and generate the mapping, but write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Seconds to wait for each refactor engine answer
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Fail instead of skipping files that cannot be parsed
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Serialize)]
pub struct RunOutput {
    pub command: &'static str,
    pub config: ProjectConfig,
    pub seeded: bool,
    #[serde(flatten)]
    pub report: RunReport,
}

pub fn run(args: RunArgs) -> CmdResult<RunOutput> {
    let root = args.project.root()?;
    let mut config = ProjectConfig::load(&root)?;
    args.selection.apply(&mut config)?;

    if let Some(seed) = &args.seed {
        config.seed = Some(seed.clone());
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err(masquerade::Error::validation_invalid_argument(
                "timeout",
                "Must be at least 1 second",
                None,
                None,
            ));
        }
        config.engine_timeout_secs = timeout;
    }

    let mut options = RunOptions::from_config(&config)?;
    options.workers = args.selection.workers;
    options.dry_run = args.dry_run;
    options.strict = args.strict;

    let engine = LexicalEngine::new(&root, options.filter.clone());
    let client = EngineClient::spawn(engine, Duration::from_secs(config.engine_timeout_secs))?;
    let mut anonymizer = Anonymizer::new(
        Arc::new(DartParser),
        client,
        Arc::new(StatusLineProgress),
        CancelToken::new(),
    );

    let report = anonymizer.run(&options)?;
    let exit_code = match report.state {
        RunState::Completed | RunState::Cancelled => 0,
        _ => 1,
    };

    Ok((
        RunOutput {
            command: "run",
            seeded: config.seed().is_some(),
            config,
            report,
        },
        exit_code,
    ))
}
