use clap::Args;
use std::path::PathBuf;

use masquerade::config::ProjectConfig;

pub type CmdResult<T> = masquerade::Result<(T, i32)>;

/// Project selection shared by every command.
#[derive(Args, Debug, Default)]
pub struct ProjectArgs {
    /// Project root (default: current directory). `~` is expanded.
    #[arg(long, value_name = "DIR")]
    pub path: Option<String>,
}

impl ProjectArgs {
    pub fn root(&self) -> masquerade::Result<PathBuf> {
        let raw = self.path.as_deref().unwrap_or(".");
        let expanded = shellexpand::tilde(raw).to_string();
        let root = PathBuf::from(&expanded);
        if !root.is_dir() {
            return Err(masquerade::Error::validation_invalid_argument(
                "path",
                format!("Not a directory: {}", expanded),
                None,
                None,
            ));
        }
        std::fs::canonicalize(&root).map_err(|e| {
            masquerade::Error::internal_io(e.to_string(), Some(format!("resolve {}", expanded)))
        })
    }
}

/// Selection flags that override `projectEncrypt.properties`.
#[derive(Args, Debug, Default)]
pub struct SelectionArgs {
    /// Marker annotation name (default: De)
    #[arg(long)]
    pub marker: Option<String>,
    /// Source file extension (default: dart)
    #[arg(long)]
    pub extension: Option<String>,
    /// Scan worker threads (default: available parallelism)
    #[arg(long)]
    pub workers: Option<usize>,
}

impl SelectionArgs {
    pub fn apply(&self, config: &mut ProjectConfig) -> masquerade::Result<()> {
        if let Some(marker) = &self.marker {
            config.set_marker(marker)?;
        }
        if let Some(extension) = &self.extension {
            config.set_extension(extension)?;
        }
        if self.workers == Some(0) {
            return Err(masquerade::Error::validation_invalid_argument(
                "workers",
                "Must be at least 1",
                None,
                None,
            ));
        }
        Ok(())
    }
}

pub mod init;
pub mod mapping;
pub mod run;
pub mod scan;

/// Run a command's handler and turn its result into JSON plus an exit code.
macro_rules! dispatch {
    ($args:expr, $module:ident) => {
        crate::output::command_outcome($module::run($args))
    };
}

pub(crate) fn run_json(command: crate::Commands) -> (masquerade::Result<serde_json::Value>, i32) {
    crate::tty::status("masquerade is working...");

    match command {
        crate::Commands::Run(args) => dispatch!(args, run),
        crate::Commands::Scan(args) => dispatch!(args, scan),
        crate::Commands::Mapping(args) => dispatch!(args, mapping),
        crate::Commands::Init(args) => dispatch!(args, init),
    }
}
