use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Sender};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use tracing::{debug, info};

use crate::ast::file::File;
use crate::ast::js_ast::JsAst;
use crate::compiler::{Compiler, Context};
use crate::error::{BuildError, ShakeError};
use crate::module::{Dependency, Module, ModuleId};
use crate::module_graph::ModuleGraph;
use crate::utils::thread_pool;

pub mod compile;
pub mod load;
pub mod resolve;

/// One file to load, parse and compile.
#[derive(Debug, Clone)]
pub struct Task {
    pub path: PathBuf,
    pub is_entry: bool,
    /// Specifier and importing module that scheduled this task.
    pub origin: Option<(String, ModuleId)>,
}

impl Task {
    pub fn entry(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            is_entry: true,
            origin: None,
        }
    }
}

impl Compiler {
    /// Compiles the entry and every module it transitively imports into a fresh graph.
    /// Modules are inserted sorted by id, so graph indices do not depend on scheduling.
    pub fn build(&self, entry: &Path) -> Result<ModuleGraph> {
        debug!("build: {}", entry.display());
        let t_build = Instant::now();
        let (rs, rr) = channel::<Result<Module>>();

        let mut scheduled = HashSet::new();
        scheduled.insert(ModuleId::from(entry.to_path_buf()));
        let mut count = 1;
        Self::build_with_pool(self.context.clone(), Task::entry(entry), rs.clone());

        let mut modules = vec![];
        let mut errors = vec![];
        for result in &rr {
            count -= 1;
            match result {
                Ok(module) => {
                    for import in &module.imports {
                        if scheduled.insert(import.target.clone()) {
                            count += 1;
                            Self::build_with_pool(
                                self.context.clone(),
                                Task {
                                    path: import.target.path().to_path_buf(),
                                    is_entry: false,
                                    origin: Some((import.source.clone(), module.id.clone())),
                                },
                                rs.clone(),
                            );
                        }
                    }
                    modules.push(module);
                }
                Err(err) => errors.push(err),
            }

            if count == 0 {
                break;
            }
        }
        drop(rs);
        debug!("build tasks done");

        if !errors.is_empty() {
            errors.sort_by_key(|err| err.to_string());
            if errors.len() == 1 {
                return Err(errors.remove(0));
            }
            return Err(anyhow!(BuildError::Tasks { errors }));
        }

        modules.sort_by(|a, b| a.id.cmp(&b.id));
        let edges = modules
            .iter()
            .flat_map(|module| {
                module.imports.iter().enumerate().map(|(order, import)| {
                    (
                        module.id.clone(),
                        import.target.clone(),
                        Dependency {
                            source: import.source.clone(),
                            order,
                        },
                    )
                })
            })
            .collect::<Vec<_>>();

        let mut module_graph = ModuleGraph::new();
        for module in modules {
            module_graph.add_module(module);
        }
        for (from, to, dependency) in edges {
            debug!("dependency {} -> {} ({})", from, to, dependency.source);
            module_graph.add_dependency(&from, &to, dependency);
        }

        info!(
            "{} modules compiled in {}ms",
            module_graph.len(),
            t_build.elapsed().as_millis()
        );
        Ok(module_graph)
    }

    fn build_with_pool(context: Arc<Context>, task: Task, rs: Sender<Result<Module>>) {
        thread_pool::spawn(move || {
            let result = Self::build_module(&context, task);
            rs.send(result).unwrap();
        });
    }

    pub fn build_module(context: &Arc<Context>, task: Task) -> Result<Module> {
        let path_str = task.path.to_string_lossy().to_string();
        let content = context.loader.load(&task.path).map_err(|err| match &task.origin {
            Some((specifier, importer)) => anyhow!(ShakeError::ModuleNotFound {
                specifier: specifier.clone(),
                importer: importer.id.clone(),
                path: path_str.clone(),
            }),
            None => anyhow!(ShakeError::InvalidEntrypoint {
                path: path_str.clone(),
                reason: err.to_string(),
            }),
        })?;

        let file = if task.is_entry {
            File::new_entry(task.path.clone(), content)
        } else {
            File::new(task.path.clone(), content)
        };
        let ast = JsAst::new(&file, context.cm.clone(), &context.config).map_err(|err| {
            match err.downcast::<ShakeError>() {
                Ok(ShakeError::Parse { path, messages }) if task.is_entry => {
                    anyhow!(ShakeError::InvalidEntrypoint {
                        path,
                        reason: messages,
                    })
                }
                Ok(err) => anyhow!(err),
                Err(err) => err,
            }
        })?;
        let module = compile::compile_module(&file, &ast, &context.config)?;
        debug!("module compiled: {}", module.id);
        Ok(module)
    }
}
