use clap::Args;
use serde::Serialize;

use masquerade::config::ProjectConfig;
use masquerade::progress::{CancelToken, StatusLineProgress};
use masquerade::scanner::{self, ScanOptions, ScanReport};
use masquerade::source::DartParser;

use super::{CmdResult, ProjectArgs, SelectionArgs};

#[derive(Args)]
pub struct ScanArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[command(flatten)]
    pub selection: SelectionArgs,
}

#[derive(Debug, Serialize)]
pub struct ScanOutput {
    pub command: &'static str,
    pub marker: String,
    pub extension: String,
    #[serde(flatten)]
    pub report: ScanReport,
}

pub fn run(args: ScanArgs) -> CmdResult<ScanOutput> {
    let root = args.project.root()?;
    let mut config = ProjectConfig::load(&root)?;
    args.selection.apply(&mut config)?;

    let options = ScanOptions {
        root,
        filter: config.file_filter(),
        marker: config.marker.clone(),
        workers: args.selection.workers,
    };
    let report = scanner::scan(&options, &DartParser, &CancelToken::new(), &StatusLineProgress)?;

    Ok((
        ScanOutput {
            command: "scan",
            marker: config.marker,
            extension: config.extension,
            report,
        },
        0,
    ))
}
