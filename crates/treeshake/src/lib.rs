use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

pub mod ast;
pub mod build;
pub mod compiler;
pub mod config;
pub mod emit;
pub mod error;
pub mod link;
pub mod module;
pub mod module_graph;
pub mod utils;
pub mod visitors;

pub use build::load::{FsLoader, Loader, MemoryLoader};
pub use compiler::{check_entry, Compiler};
pub use config::Config;
pub use error::ShakeError;

/// Tree-shakes the program rooted at `entrypoint`, reading files from disk.
/// `treeshake.config.json` next to the entry file is used when present.
pub fn run(entrypoint: &Path) -> Result<String> {
    let root = entrypoint.parent().unwrap_or_else(|| Path::new(""));
    let config = load_config(root, None, entrypoint)?;
    Compiler::new(config, Arc::new(FsLoader)).compile(entrypoint)
}

/// Loads the config for `entrypoint`. When the config file is broken, an entry that
/// is not a source file under the default config is reported as the invalid entry
/// instead.
pub fn load_config(root: &Path, config_path: Option<&Path>, entrypoint: &Path) -> Result<Config> {
    Config::new(root, config_path).or_else(|err| {
        check_entry(&Config::default(), entrypoint)?;
        Err(err)
    })
}
