use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use anyhow::{anyhow, Result};
use swc_core::common::sync::Lrc;
use swc_core::common::SourceMap;
use tracing::{debug, info};

use crate::ast::file::normalize;
use crate::build::load::Loader;
use crate::config::Config;
use crate::emit::Emitter;
use crate::error::ShakeError;
use crate::link::{collect_roots, link};
use crate::module_graph::ModuleGraph;

pub struct Context {
    pub config: Config,
    pub cm: Lrc<SourceMap>,
    pub loader: Arc<dyn Loader>,
    /// Graph of the last successful compilation.
    pub module_graph: RwLock<ModuleGraph>,
}

pub struct Compiler {
    pub context: Arc<Context>,
}

impl Compiler {
    pub fn new(config: Config, loader: Arc<dyn Loader>) -> Self {
        Self {
            context: Arc::new(Context {
                config,
                cm: Default::default(),
                loader,
                module_graph: RwLock::new(ModuleGraph::new()),
            }),
        }
    }

    /// Entry check, build, link, emit. Any error aborts the run with no output.
    pub fn compile(&self, entry: &Path) -> Result<String> {
        let t_compile = Instant::now();
        let entry = normalize(entry);
        check_entry(&self.context.config, &entry)?;

        let mut module_graph = self.build(&entry)?;
        link(&mut module_graph, &self.context.config)?;
        let roots = collect_roots(&module_graph)?;
        debug!("roots: {:?}", roots);
        let output = Emitter::new(&module_graph).emit(&roots);

        *self.context.module_graph.write().unwrap() = module_graph;
        info!(
            "tree shaking of {} done in {}ms",
            entry.display(),
            t_compile.elapsed().as_millis()
        );
        Ok(output)
    }
}

/// Rejects an entry whose extension is not the configured source extension.
pub fn check_entry(config: &Config, entry: &Path) -> Result<()> {
    if config.is_source_file(entry) {
        return Ok(());
    }
    Err(anyhow!(ShakeError::InvalidEntrypoint {
        path: normalize(entry).to_string_lossy().to_string(),
        reason: format!("expected a .{} source file", config.extension),
    }))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::module::ModuleId;
    use crate::utils::test_helper::{compile_files, setup_compiler};

    #[test]
    fn test_compile() {
        let output = compile_files(&[
            (
                "/src/index.ts",
                "import { helper } from './helper';\nexport function main() { return helper(); }",
            ),
            (
                "/src/helper.ts",
                "export function helper() { return 1; }\nexport function unused() {}",
            ),
        ])
        .unwrap();
        assert_eq!(
            output,
            "export function main() { return helper(); }\nfunction helper() { return 1; }"
        );
    }

    #[test]
    fn test_invalid_entrypoint() {
        let err = compile_files(&[("/src/index.js", "export const a = 1;")]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ShakeError>(),
            Some(ShakeError::InvalidEntrypoint { path, .. }) if path == "/src/index.ts"
        ));

        let compiler = setup_compiler(&[("/src/index.js", "export const a = 1;")]);
        let err = compiler.compile(Path::new("/src/index.js")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ShakeError>(),
            Some(ShakeError::InvalidEntrypoint { reason, .. }) if reason == "expected a .ts source file"
        ));
    }

    #[test]
    fn test_graph_kept_after_compile() {
        let compiler = setup_compiler(&[
            ("/src/index.ts", "import { b } from './b';\nexport const a = b;"),
            ("/src/b.ts", "export const b = 1;"),
        ]);
        compiler.compile(Path::new("/src/./index.ts")).unwrap();
        let module_graph = compiler.context.module_graph.read().unwrap();
        assert_eq!(module_graph.len(), 2);
        assert!(module_graph
            .get_module(&ModuleId::from("/src/b.ts"))
            .is_some_and(|m| m.is_linked()));
    }
}
