use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use swc_core::ecma::ast::Module;
use tracing_subscriber::{fmt, EnvFilter};

use crate::ast::file::File;
use crate::ast::js_ast::JsAst;
use crate::build::load::MemoryLoader;
use crate::compiler::Compiler;
use crate::config::Config;

pub fn setup_logger() {
    let _result = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .without_time()
        .try_init();
}

pub fn parse_module(code: &str) -> Module {
    parse_module_at("/test/input.ts", code)
}

/// Parses `code` as the file at `path`; a `.tsx` path enables JSX.
pub fn parse_module_at(path: &str, code: &str) -> Module {
    let file = File::new(PathBuf::from(path), code.to_string());
    JsAst::new(&file, Default::default(), &Config::default())
        .unwrap()
        .ast
}

/// Compiles an in-memory program whose entry is `/src/index.ts`.
pub fn compile_files(files: &[(&str, &str)]) -> Result<String> {
    setup_logger();
    let compiler = setup_compiler(files);
    compiler.compile(&PathBuf::from("/src/index.ts"))
}

pub fn setup_compiler(files: &[(&str, &str)]) -> Compiler {
    let files = files
        .iter()
        .map(|(path, content)| (PathBuf::from(path), content.to_string()))
        .collect::<HashMap<_, _>>();
    Compiler::new(Config::default(), Arc::new(MemoryLoader::new(files)))
}
