use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, error};
use treeshake::utils::logger::init_logger;
use treeshake::{load_config, Compiler, FsLoader};

#[derive(Parser, Debug)]
#[command(author, version, about = "Emit only the declarations reachable from an entry module", long_about = None)]
struct Cli {
    /// Entry source file
    entry: PathBuf,
    /// Config file, defaults to treeshake.config.json next to the entry
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Write the result to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn run(cli: Cli) -> Result<()> {
    let root = cli
        .entry
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_default();
    // relative to the working directory, not the entry
    let config_path = match cli.config {
        Some(path) if path.is_relative() => Some(std::env::current_dir()?.join(path)),
        path => path,
    };
    let config = load_config(&root, config_path.as_deref(), &cli.entry)?;
    debug!("config: {:?}", config);

    let compiler = Compiler::new(config, Arc::new(FsLoader));
    let output = compiler.compile(&cli.entry)?;
    match cli.output {
        Some(path) => std::fs::write(&path, output)?,
        None => println!("{}", output),
    }
    Ok(())
}

fn main() -> ExitCode {
    init_logger();
    let cli = Cli::parse();
    debug!("cli: {:?}", cli);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
