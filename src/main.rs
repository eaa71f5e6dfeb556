use clap::{Parser, Subcommand};

mod commands;
mod output;
mod tty;

use commands::{init, mapping, run, scan};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "masquerade")]
#[command(version = VERSION)]
#[command(about = "Replace annotated identifiers with deterministic generated names")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan, generate the mapping, and rename every marked declaration
    Run(run::RunArgs),
    /// List marked names without changing anything
    Scan(scan::ScanArgs),
    /// Show the last persisted name mapping
    Mapping(mapping::MappingArgs),
    /// Write the channel name into projectEncrypt.properties
    Init(init::InitArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let (json_result, exit_code) = commands::run_json(cli.command);
    if output::print_json_result(json_result).is_err() {
        return std::process::ExitCode::from(1);
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
