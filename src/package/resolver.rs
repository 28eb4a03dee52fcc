//! Resolution of git-reference descriptors.
//!
//! A git ref is already concrete, so a descriptor has exactly one candidate:
//! a locator with the same reference. The package metadata, however, lives
//! only inside the checkout, so resolving a locator fetches it and reads the
//! manifest from the fetched archive.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::package::archive;
use crate::package::fetcher::{FetchResult, GitFetcher};
use crate::package::locator::{supports_range, Descriptor, Locator};
use crate::package::manifest::{Manifest, MANIFEST_FILE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LinkType {
    Hard,
    Soft,
}

/// Metadata of a resolved package.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPackage {
    pub name: String,
    pub reference: String,
    pub version: String,
    pub language_name: String,
    pub link_type: LinkType,
    pub dependencies: BTreeMap<String, String>,
    pub peer_dependencies: BTreeMap<String, String>,
    pub dependencies_meta: BTreeMap<String, Value>,
    pub peer_dependencies_meta: BTreeMap<String, Value>,
    pub bin: BTreeMap<String, String>,
}

pub struct GitResolver {
    fetcher: Arc<GitFetcher>,
    default_language: String,
}

impl GitResolver {
    pub fn new(fetcher: Arc<GitFetcher>, default_language: impl Into<String>) -> Self {
        Self {
            fetcher,
            default_language: default_language.into(),
        }
    }

    pub fn supports_descriptor(&self, descriptor: &Descriptor) -> bool {
        supports_range(&descriptor.range)
    }

    pub fn supports_locator(&self, locator: &Locator) -> bool {
        supports_range(&locator.reference)
    }

    /// The single candidate: the descriptor's own reference.
    pub fn get_candidates(&self, descriptor: &Descriptor) -> Result<Vec<Locator>> {
        if !self.supports_descriptor(descriptor) {
            return Err(Error::InvalidLocator {
                locator: descriptor.to_string(),
                message: "not a git-reference range".to_string(),
            });
        }
        Ok(vec![Locator::from_descriptor(descriptor)])
    }

    pub fn resolve(&self, locator: &Locator) -> Result<ResolvedPackage> {
        self.resolve_and_fetch(locator).map(|(resolved, _)| resolved)
    }

    /// Fetches `locator` and reads its metadata from the fetched manifest.
    pub fn resolve_and_fetch(&self, locator: &Locator) -> Result<(ResolvedPackage, FetchResult)> {
        let fetched = self.fetcher.fetch(locator)?;
        let package = locator.ident.to_string();

        let bytes = archive::read_entry(&fetched.archive, &fetched.entry(MANIFEST_FILE))?
            .ok_or_else(|| Error::Manifest {
                package: package.clone(),
                message: format!("no {} in {}", MANIFEST_FILE, fetched.locator.reference),
            })?;
        let manifest = Manifest::from_slice(&bytes, &package)?;

        let resolved = ResolvedPackage {
            name: package.clone(),
            reference: fetched.locator.reference.clone(),
            version: manifest.version(&package)?.to_string(),
            language_name: manifest
                .language_name
                .clone()
                .unwrap_or_else(|| self.default_language.clone()),
            link_type: LinkType::Hard,
            bin: manifest.binaries(&locator.ident.name),
            dependencies: manifest.dependencies,
            peer_dependencies: manifest.peer_dependencies,
            dependencies_meta: manifest.dependencies_meta,
            peer_dependencies_meta: manifest.peer_dependencies_meta,
        };
        Ok((resolved, fetched))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::cache::CacheStatus;
    use crate::package::fetcher::fixture::*;

    const UI: &[(&str, &str)] = &[(
        "package.json",
        r#"{
            "name": "@shared/ui",
            "version": "2.1.0",
            "dependencies": {"react": "^18.2.0"},
            "peerDependencies": {"styled-components": "^6"},
            "dependenciesMeta": {"react": {"built": false}},
            "bin": "bin/ui.js"
        }"#,
    )];

    fn descriptor(text: &str) -> Descriptor {
        Descriptor::parse(text).unwrap()
    }

    #[test]
    fn test_single_candidate_with_same_reference() {
        let h = harness(FakeTransport::new(&[]), None);
        let resolver = GitResolver::new(h.fetcher.clone(), "node");
        let d = descriptor("@shared/ui@polyrepo+git@gitlab.com:g/ui.git#feature-x");

        let candidates = resolver.get_candidates(&d).unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].reference, d.range);
        assert!(resolver.supports_locator(&candidates[0]));
    }

    #[test]
    fn test_registry_ranges_are_not_supported() {
        let h = harness(FakeTransport::new(&[]), None);
        let resolver = GitResolver::new(h.fetcher.clone(), "node");
        let d = descriptor("react@^18.2.0");

        assert!(!resolver.supports_descriptor(&d));
        assert!(resolver.get_candidates(&d).is_err());
    }

    #[test]
    fn test_resolve_reads_metadata_from_fetched_manifest() {
        let h = harness(FakeTransport::new(&[("develop", UI)]), Some("develop"));
        let resolver = GitResolver::new(h.fetcher.clone(), "node");
        let locator = locator("@shared/ui", "polyrepo+git@gitlab.com:g/ui.git");

        let (resolved, fetched) = resolver.resolve_and_fetch(&locator).unwrap();

        assert_eq!(resolved.name, "@shared/ui");
        assert_eq!(resolved.reference, "polyrepo+git@gitlab.com:g/ui.git#develop");
        assert_eq!(resolved.version, "2.1.0");
        assert_eq!(resolved.language_name, "node");
        assert_eq!(resolved.link_type, LinkType::Hard);
        assert_eq!(resolved.dependencies["react"], "^18.2.0");
        assert_eq!(resolved.peer_dependencies["styled-components"], "^6");
        assert!(resolved.dependencies_meta.contains_key("react"));
        assert_eq!(resolved.bin["ui"], "bin/ui.js");
        assert_eq!(fetched.status, CacheStatus::Miss);

        // The later fetch reuses the resolution's work
        let again = h.fetcher.fetch(&locator).unwrap();
        assert_eq!(again, fetched);
        let misses = h.reporter.events().iter().filter(|e| e.starts_with("miss")).count();
        assert_eq!(misses, 1);
    }

    #[test]
    fn test_missing_version_defaults() {
        let tree: &[(&str, &str)] = &[("package.json", r#"{"name":"x","languageName":"unknown"}"#)];
        let h = harness(FakeTransport::new(&[("main", tree)]), None);
        let resolver = GitResolver::new(h.fetcher.clone(), "node");

        let resolved = resolver
            .resolve(&locator("x", "polyrepo+https://gitlab.com/g/x.git#main"))
            .unwrap();

        assert_eq!(resolved.version, "0.0.0");
        assert_eq!(resolved.language_name, "unknown");
        assert!(resolved.bin.is_empty());
    }

    #[test]
    fn test_missing_manifest_is_an_error() {
        let tree: &[(&str, &str)] = &[("README.md", "hi")];
        let h = harness(FakeTransport::new(&[("main", tree)]), None);
        let resolver = GitResolver::new(h.fetcher.clone(), "node");

        let err = resolver
            .resolve(&locator("x", "polyrepo+https://gitlab.com/g/x.git#main"))
            .unwrap_err();
        assert!(matches!(err, Error::Manifest { .. }));
    }

    #[test]
    fn test_serializes_like_installer_metadata() {
        let h = harness(FakeTransport::new(&[("main", UI)]), None);
        let resolver = GitResolver::new(h.fetcher.clone(), "node");
        let resolved = resolver
            .resolve(&locator("@shared/ui", "polyrepo+git@gitlab.com:g/ui.git#main"))
            .unwrap();

        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["linkType"], "HARD");
        assert_eq!(json["languageName"], "node");
        assert_eq!(json["peerDependencies"]["styled-components"], "^6");
    }
}
