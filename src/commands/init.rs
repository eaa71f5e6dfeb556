use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use masquerade::config::{self, CHANNEL_KEY};

use super::{CmdResult, ProjectArgs};

#[derive(Args)]
pub struct InitArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Channel name used to seed generated names
    #[arg(long)]
    pub channel: String,

    /// Replace an existing channel name
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
pub struct InitOutput {
    pub command: &'static str,
    pub file: PathBuf,
    pub key: &'static str,
    pub next_steps: Vec<String>,
}

pub fn run(args: InitArgs) -> CmdResult<InitOutput> {
    let root = args.project.root()?;
    let file = config::init(&root, &args.channel, args.force)?;

    Ok((
        InitOutput {
            command: "init",
            file,
            key: CHANNEL_KEY,
            next_steps: vec![
                "Annotate variables to anonymize with @De".to_string(),
                "Run `masquerade run --dry-run` to preview the mapping".to_string(),
                "Run `masquerade run` to rename".to_string(),
            ],
        },
        0,
    ))
}
