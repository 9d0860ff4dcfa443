use colored::Colorize;
use thiserror::Error;

/// Fatal errors of a tree-shaking run. Every one of them aborts the run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShakeError {
    #[error("Invalid entrypoint \"{path}\": {reason}")]
    InvalidEntrypoint { path: String, reason: String },
    #[error("Module \"{specifier}\" imported by \"{importer}\" not found at \"{path}\"")]
    ModuleNotFound {
        specifier: String,
        importer: String,
        path: String,
    },
    #[error("Parse file \"{path}\" failed:\n{messages}")]
    Parse { path: String, messages: String },
    #[error("Unsupported syntax in \"{path}\": {message}")]
    ParseShape { path: String, message: String },
    #[error("Duplicate declaration \"{name}\" in \"{module}\"")]
    DuplicateDeclaration { name: String, module: String },
    #[error("Unresolved symbol \"{name}\" in \"{module}\"")]
    UnresolvedSymbol { name: String, module: String },
    #[error("Aliasing is not supported: \"{local}\" refers to \"{imported}\" in \"{module}\"")]
    AliasMismatch {
        local: String,
        imported: String,
        module: String,
    },
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{:}\n{:}", "Build failed.".red().to_string(), errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("\n"))]
    Tasks { errors: Vec<anyhow::Error> },
}
