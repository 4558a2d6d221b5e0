// Compile options
//
// Read from a TOML file such as:
//
//   keep_descriptions = false
//   identifier_fields = ["_id"]
//   case_insensitive_constraints = true
//
// Every key is optional; unknown keys are rejected so typos surface.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompileOptions {
    /// Carry trailing `//` comments into the IR as field descriptions.
    pub keep_descriptions: bool,

    /// Field names treated as the primary identifier of an entity.
    pub identifier_fields: Vec<String>,

    /// Match constraint names regardless of case (`minlength` == `minLength`).
    pub case_insensitive_constraints: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            keep_descriptions: true,
            identifier_fields: vec!["_id".to_string(), "id".to_string()],
            case_insensitive_constraints: true,
        }
    }
}

impl CompileOptions {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::without_span(ErrorKind::Config(e.to_string())))
    }

    /// Load options from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::without_span(ErrorKind::Config(format!("cannot read `{}`: {e}", path.display())))
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{Diagnostic, DiagnosticKind};
    use crate::source::SourceMap;

    #[test]
    fn test_defaults() {
        let opts = CompileOptions::from_toml_str("").unwrap();
        assert_eq!(opts, CompileOptions::default());
        assert!(opts.keep_descriptions);
        assert_eq!(opts.identifier_fields, vec!["_id", "id"]);
    }

    #[test]
    fn test_partial_override() {
        let opts = CompileOptions::from_toml_str("identifier_fields = [\"uuid\"]\n").unwrap();
        assert_eq!(opts.identifier_fields, vec!["uuid"]);
        assert!(opts.case_insensitive_constraints);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = CompileOptions::from_toml_str("keep_comments = true").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vsl.toml");
        std::fs::write(&path, "keep_descriptions = false\n").unwrap();
        let opts = CompileOptions::load(&path).unwrap();
        assert!(!opts.keep_descriptions);

        let missing = CompileOptions::load(&dir.path().join("none.toml")).unwrap_err();
        assert!(matches!(&missing.kind, ErrorKind::Config(m) if m.starts_with("cannot read")));
        let diag = Diagnostic::from_error(&missing, &SourceMap::new(), &path);
        assert_eq!(diag.kind, DiagnosticKind::ConfigError);
    }
}
