use std::collections::HashSet;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const CONFIG_FILE: &str = "treeshake.config.json";

/// Names provided by the ECMAScript runtime, TypeScript's builtin types and common hosts.
const BUILTIN_GLOBALS: &[&str] = &[
    // values
    "undefined",
    "NaN",
    "Infinity",
    "globalThis",
    "Object",
    "Function",
    "Array",
    "Number",
    "Boolean",
    "String",
    "Symbol",
    "BigInt",
    "Math",
    "JSON",
    "Date",
    "RegExp",
    "Error",
    "TypeError",
    "RangeError",
    "SyntaxError",
    "ReferenceError",
    "EvalError",
    "URIError",
    "AggregateError",
    "Promise",
    "Proxy",
    "Reflect",
    "Map",
    "Set",
    "WeakMap",
    "WeakSet",
    "WeakRef",
    "ArrayBuffer",
    "SharedArrayBuffer",
    "DataView",
    "Int8Array",
    "Uint8Array",
    "Uint8ClampedArray",
    "Int16Array",
    "Uint16Array",
    "Int32Array",
    "Uint32Array",
    "Float32Array",
    "Float64Array",
    "BigInt64Array",
    "BigUint64Array",
    "Intl",
    "Atomics",
    "parseInt",
    "parseFloat",
    "isNaN",
    "isFinite",
    "encodeURI",
    "encodeURIComponent",
    "decodeURI",
    "decodeURIComponent",
    "eval",
    // hosts
    "console",
    "setTimeout",
    "clearTimeout",
    "setInterval",
    "clearInterval",
    "queueMicrotask",
    "structuredClone",
    "window",
    "document",
    "process",
    // types
    "Partial",
    "Required",
    "Readonly",
    "Record",
    "Pick",
    "Omit",
    "Exclude",
    "Extract",
    "NonNullable",
    "Parameters",
    "ReturnType",
    "InstanceType",
    "Awaited",
    "PromiseLike",
    "ReadonlyArray",
    "Iterable",
    "Iterator",
    "IterableIterator",
    "AsyncIterable",
    "AsyncIterator",
    "ArrayLike",
    "PropertyKey",
    "ThisType",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file \"{path}\": {message}")]
    Read { path: String, message: String },
    #[error("Config file \"{path}\" parsed failed: {message}")]
    Parse { path: String, message: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Recognized source file extension, without the dot.
    pub extension: String,
    /// Extra names that resolve without a declaration.
    pub globals: Vec<String>,
    pub builtin_globals: bool,
    pub decorators: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extension: "ts".to_string(),
            globals: vec![],
            builtin_globals: true,
            decorators: true,
        }
    }
}

impl Config {
    /// Loads `treeshake.config.json` from `root`, or `config_path` when given.
    /// A missing file yields the default config.
    pub fn new(root: &Path, config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(path) if path.is_absolute() => path.to_path_buf(),
            Some(path) => root.join(path),
            None => root.join(CONFIG_FILE),
        };
        if !path.exists() {
            if config_path.is_some() {
                return Err(anyhow!(ConfigError::Read {
                    path: path.to_string_lossy().to_string(),
                    message: "file does not exist".to_string(),
                }));
            }
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| {
            anyhow!(ConfigError::Read {
                path: path.to_string_lossy().to_string(),
                message: e.to_string(),
            })
        })?;
        let config = Self::from_str(&content).map_err(|e| {
            anyhow!(ConfigError::Parse {
                path: path.to_string_lossy().to_string(),
                message: e.to_string(),
            })
        })?;
        debug!("config loaded from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn from_str(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    pub fn global_names(&self) -> HashSet<String> {
        let mut names = self.globals.iter().cloned().collect::<HashSet<_>>();
        if self.builtin_globals {
            names.extend(BUILTIN_GLOBALS.iter().map(|name| name.to_string()));
        }
        names
    }

    pub fn is_source_file(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext.to_string_lossy() == self.extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.extension, "ts");
        assert!(config.global_names().contains("console"));
        assert!(config.is_source_file(Path::new("/tmp/a.ts")));
        assert!(!config.is_source_file(Path::new("/tmp/a.js")));
        assert!(!config.is_source_file(Path::new("/tmp/ts")));
    }

    #[test]
    fn test_partial_config() {
        let config = Config::from_str(r#"{ "globals": ["Deno"], "builtinGlobals": false }"#).unwrap();
        assert_eq!(config.extension, "ts");
        let names = config.global_names();
        assert!(names.contains("Deno"));
        assert!(!names.contains("console"));
    }

    #[test]
    fn test_invalid_config() {
        assert!(Config::from_str(r#"{ "extension": 1 }"#).is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let config = Config::new(Path::new("/definitely/not/here"), None).unwrap();
        assert!(config.builtin_globals);
        let err = Config::new(
            Path::new("/definitely/not/here"),
            Some(Path::new("custom.json")),
        )
        .unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }
}
