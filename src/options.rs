use crate::diagnostics::RewriteError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Names the translation looks for and synthesizes.
///
/// Every field has a default, so an options file only needs the entries it
/// overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RewriteOptions {
    /// Extension (without dot) of the files to translate.
    pub extension: String,
    /// Module providing `StackReference` and `Config`.
    pub source_module: String,
    /// Module providing `Remote`, `Offer` and `RemoteConnection`.
    pub core_module: String,
    pub reference_constructor: String,
    pub config_constructor: String,
    pub source_alias: String,
    pub core_alias: String,
    pub config_name: String,
    pub host_key: String,
    pub port_key: String,
    /// Field and type lists with at least this many entries go one per line.
    pub multiline_threshold: usize,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            extension: "ts".to_string(),
            source_module: "@pulumi/pulumi".to_string(),
            core_module: "@mjus/core/resources".to_string(),
            reference_constructor: "StackReference".to_string(),
            config_constructor: "Config".to_string(),
            source_alias: "pulumi".to_string(),
            core_alias: "mjus".to_string(),
            config_name: "config".to_string(),
            host_key: "infrastructureHost".to_string(),
            port_key: "infrastructurePort".to_string(),
            multiline_threshold: 4,
        }
    }
}

impl RewriteOptions {
    pub fn from_file(path: &Path) -> Result<Self, RewriteError> {
        let data = fs::read_to_string(path).map_err(|source| RewriteError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| RewriteError::Options {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_options_keep_defaults() {
        let options: RewriteOptions =
            serde_json::from_str(r#"{ "coreAlias": "core", "multilineThreshold": 2 }"#).unwrap();
        assert_eq!(options.core_alias, "core");
        assert_eq!(options.multiline_threshold, 2);
        assert_eq!(options.source_module, "@pulumi/pulumi");
        assert_eq!(options.reference_constructor, "StackReference");
    }

    #[test]
    fn test_from_file_reports_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            RewriteOptions::from_file(&path),
            Err(RewriteError::Options { .. })
        ));
    }
}
