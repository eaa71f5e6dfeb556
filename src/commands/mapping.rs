use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use masquerade::config::ProjectConfig;
use masquerade::mapping;
use masquerade::naming::NameMapping;

use super::{CmdResult, ProjectArgs};

#[derive(Args)]
pub struct MappingArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

#[derive(Debug, Serialize)]
pub struct MappingOutput {
    pub command: &'static str,
    pub file: PathBuf,
    pub exists: bool,
    pub count: usize,
    pub entries: NameMapping,
}

pub fn run(args: MappingArgs) -> CmdResult<MappingOutput> {
    let root = args.project.root()?;
    let config = ProjectConfig::load(&root)?;
    let file = config.mapping_path();
    let loaded = mapping::load(&file)?;
    let exists = loaded.is_some();
    let entries = loaded.unwrap_or_default();

    Ok((
        MappingOutput {
            command: "mapping",
            file,
            exists,
            count: entries.len(),
            entries,
        },
        if exists { 0 } else { 1 },
    ))
}
