pub(crate) mod error;
pub mod file;
pub(crate) mod js_ast;
