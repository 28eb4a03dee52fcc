//! The subset of `package.json` the resolver reads.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use semver::Version;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

pub const MANIFEST_FILE: &str = "package.json";

/// `bin` is either a single path or a map of command names to paths.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum BinField {
    Path(String),
    Map(BTreeMap<String, String>),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub language_name: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub peer_dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub dependencies_meta: BTreeMap<String, Value>,
    #[serde(default)]
    pub peer_dependencies_meta: BTreeMap<String, Value>,
    #[serde(default)]
    pub bin: Option<BinField>,
    #[serde(default)]
    pub scripts: BTreeMap<String, String>,
}

impl Manifest {
    /// Parses manifest bytes; `package` names the owner in errors.
    pub fn from_slice(bytes: &[u8], package: &str) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::Manifest {
            package: package.to_string(),
            message: e.to_string(),
        })
    }

    /// Reads `package.json` in `dir`, if there is one.
    pub fn find(dir: &Path, package: &str) -> Result<Option<Self>> {
        let path = dir.join(MANIFEST_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        Self::from_slice(&fs::read(path)?, package).map(Some)
    }

    pub fn has_script(&self, name: &str) -> bool {
        self.scripts.contains_key(name)
    }

    /// The declared version, `0.0.0` when absent.
    pub fn version(&self, package: &str) -> Result<Version> {
        match self.version.as_deref() {
            None | Some("") => Ok(Version::new(0, 0, 0)),
            Some(version) => Version::parse(version).map_err(|e| Error::Manifest {
                package: package.to_string(),
                message: format!("invalid version `{}`: {}", version, e),
            }),
        }
    }

    /// Command name to path. A string `bin` is exposed under `bare_name`.
    pub fn binaries(&self, bare_name: &str) -> BTreeMap<String, String> {
        match &self.bin {
            None => BTreeMap::new(),
            Some(BinField::Path(path)) => BTreeMap::from([(bare_name.to_string(), path.clone())]),
            Some(BinField::Map(map)) => map.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_full_manifest() {
        let manifest = Manifest::from_slice(
            br#"{
                "name": "@shared/ui",
                "version": "1.4.0",
                "dependencies": {"react": "^18.0.0"},
                "peerDependencies": {"react-dom": "*"},
                "peerDependenciesMeta": {"react-dom": {"optional": true}},
                "scripts": {"prepack": "tsc"},
                "bin": {"ui": "bin/ui.js"}
            }"#,
            "@shared/ui",
        )
        .unwrap();

        assert_eq!(manifest.version("@shared/ui").unwrap(), Version::new(1, 4, 0));
        assert_eq!(manifest.dependencies["react"], "^18.0.0");
        assert!(manifest.peer_dependencies_meta.contains_key("react-dom"));
        assert!(manifest.has_script("prepack"));
        assert_eq!(manifest.binaries("ui")["ui"], "bin/ui.js");
    }

    #[test]
    fn test_defaults_for_sparse_manifest() {
        let manifest = Manifest::from_slice(b"{}", "x").unwrap();
        assert_eq!(manifest.version("x").unwrap(), Version::new(0, 0, 0));
        assert!(manifest.binaries("x").is_empty());
        assert!(!manifest.has_script("prepack"));
    }

    #[test]
    fn test_string_bin_uses_bare_name() {
        let manifest = Manifest::from_slice(br#"{"bin": "cli.js"}"#, "@org/tool").unwrap();
        assert_eq!(
            manifest.binaries("tool"),
            BTreeMap::from([("tool".to_string(), "cli.js".to_string())])
        );
    }

    #[test]
    fn test_invalid_version_is_a_manifest_error() {
        let manifest = Manifest::from_slice(br#"{"version": "one"}"#, "x").unwrap();
        assert!(matches!(manifest.version("x"), Err(Error::Manifest { .. })));
    }

    #[test]
    fn test_find_missing_manifest() {
        let temp = tempfile::TempDir::new().unwrap();
        assert!(Manifest::find(temp.path(), "x").unwrap().is_none());
        fs::write(temp.path().join(MANIFEST_FILE), "not json").unwrap();
        assert!(Manifest::find(temp.path(), "x").is_err());
    }
}
