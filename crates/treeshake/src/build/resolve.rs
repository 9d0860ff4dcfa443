use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

use crate::ast::file::normalize;
use crate::config::Config;
use crate::error::ShakeError;

pub fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Resolves `specifier` against the importing file's directory. Only relative
/// specifiers are supported; the configured extension is appended unless present.
pub fn resolve(importer: &Path, specifier: &str, config: &Config) -> Result<PathBuf> {
    if !is_relative(specifier) {
        return Err(anyhow!(ShakeError::ParseShape {
            path: importer.to_string_lossy().to_string(),
            message: format!(
                "only relative module specifiers are supported, got \"{}\"",
                specifier
            ),
        }));
    }
    let dir = importer.parent().unwrap_or_else(|| Path::new(""));
    let path = normalize(&dir.join(specifier));
    let suffix = format!(".{}", config.extension);
    if path.to_string_lossy().ends_with(&suffix) {
        Ok(path)
    } else {
        let mut with_ext = path.into_os_string();
        with_ext.push(&suffix);
        Ok(PathBuf::from(with_ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve_from(importer: &str, specifier: &str) -> Result<PathBuf> {
        resolve(Path::new(importer), specifier, &Config::default())
    }

    #[test]
    fn test_relative_specifiers() {
        assert_eq!(
            resolve_from("/src/index.ts", "./helper").unwrap(),
            PathBuf::from("/src/helper.ts")
        );
        assert_eq!(
            resolve_from("/src/app/index.ts", "../lib/./util.ts").unwrap(),
            PathBuf::from("/src/lib/util.ts")
        );
    }

    #[test]
    fn test_bare_specifier_is_rejected() {
        let err = resolve_from("/src/index.ts", "lodash").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ShakeError>(),
            Some(ShakeError::ParseShape { path, .. }) if path == "/src/index.ts"
        ));
    }
}
