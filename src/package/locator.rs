//! Package identities, descriptors and git-reference locators.
//!
//! A dependency on a sibling repository is declared with a range of the form
//! `polyrepo+<git-url>[#<ref>]`:
//!
//! ```text
//! "@shared/ui": "polyrepo+git@gitlab.com:group/shared-ui.git#develop"
//! ```
//!
//! The descriptor (`ident` + range) resolves to exactly one locator carrying
//! the same reference. Before fetching, the locator is normalised: a missing
//! `#<ref>` is filled in with the ambient branch so the cache key always names
//! a concrete ref.

use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::defaults::{ENV_BRANCH, ENV_CI_REF, PACKAGE_SCHEME};
use crate::error::{Error, Result};
use crate::git;

const REFERENCE_PATTERN: &str = r"^polyrepo\+([^#]+)#?(.*)$";

/// Directory packages are vendored under.
pub const VENDOR_DIR: &str = "node_modules";

/// True if `range` uses the git-reference scheme.
pub fn supports_range(range: &str) -> bool {
    range.starts_with(PACKAGE_SCHEME)
}

/// `@scope/name` or `name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageIdent {
    pub scope: Option<String>,
    pub name: String,
}

impl PackageIdent {
    pub fn parse(ident: &str) -> Result<Self> {
        let invalid = |message: &str| Error::InvalidLocator {
            locator: ident.to_string(),
            message: message.to_string(),
        };

        let (scope, name) = match ident.strip_prefix('@') {
            Some(scoped) => {
                let (scope, name) = scoped
                    .split_once('/')
                    .ok_or_else(|| invalid("scoped package names look like @scope/name"))?;
                (Some(scope), name)
            }
            None => (None, ident),
        };

        let bad = |part: &str| part.is_empty() || part.contains(['/', '\\', '@']);
        if bad(name) || scope.is_some_and(bad) {
            return Err(invalid("invalid package name"));
        }

        Ok(Self {
            scope: scope.map(str::to_string),
            name: name.to_string(),
        })
    }

    /// `node_modules/@scope/name`, where the package lives inside its archive.
    pub fn vendor_path(&self) -> PathBuf {
        let mut path = PathBuf::from(VENDOR_DIR);
        if let Some(scope) = &self.scope {
            path.push(format!("@{}", scope));
        }
        path.push(&self.name);
        path
    }

    /// Filesystem-safe form, `@scope-name`.
    pub fn slug(&self) -> String {
        match &self.scope {
            Some(scope) => format!("@{}-{}", scope, self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for PackageIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "@{}/{}", scope, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A dependency request: an ident and the range it was declared with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Descriptor {
    pub ident: PackageIdent,
    pub range: String,
}

impl Descriptor {
    /// Parses `<ident>@<range>`, splitting at the first `@` after the scope.
    pub fn parse(descriptor: &str) -> Result<Self> {
        let split = descriptor
            .char_indices()
            .skip(1)
            .find(|&(_, c)| c == '@')
            .map(|(i, _)| i)
            .ok_or_else(|| Error::InvalidLocator {
                locator: descriptor.to_string(),
                message: "expected <name>@<range>".to_string(),
            })?;

        Ok(Self {
            ident: PackageIdent::parse(&descriptor[..split])?,
            range: descriptor[split + 1..].to_string(),
        })
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.ident, self.range)
    }
}

/// A concrete package: an ident and the reference it resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locator {
    pub ident: PackageIdent,
    pub reference: String,
}

impl Locator {
    pub fn new(ident: PackageIdent, reference: impl Into<String>) -> Self {
        Self {
            ident,
            reference: reference.into(),
        }
    }

    /// The single candidate of a git-reference descriptor.
    pub fn from_descriptor(descriptor: &Descriptor) -> Self {
        Self::new(descriptor.ident.clone(), descriptor.range.clone())
    }

    pub fn git_reference(&self) -> Result<GitReference> {
        GitReference::parse(&self.reference)
    }

    /// Fills in the ambient branch when the reference names no ref.
    pub fn normalize(&self, ambient: &AmbientBranch) -> Result<Self> {
        let reference = self.git_reference()?;
        let git_ref = reference.resolve_ref(ambient)?;
        Ok(Self::new(
            self.ident.clone(),
            GitReference::new(reference.url, Some(git_ref)).to_string(),
        ))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.ident, self.reference)
    }
}

/// A parsed `polyrepo+<url>[#<ref>]` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitReference {
    pub url: String,
    /// `None` when no `#<ref>` (or an empty one) was given.
    pub git_ref: Option<String>,
}

impl GitReference {
    pub fn new(url: impl Into<String>, git_ref: Option<String>) -> Self {
        Self {
            url: url.into(),
            git_ref,
        }
    }

    pub fn parse(reference: &str) -> Result<Self> {
        let pattern = Regex::new(REFERENCE_PATTERN)?;
        let captures = pattern
            .captures(reference)
            .ok_or_else(|| Error::InvalidLocator {
                locator: reference.to_string(),
                message: format!("expected {}<url>[#<ref>]", PACKAGE_SCHEME),
            })?;

        let git_ref = captures
            .get(2)
            .map(|m| m.as_str())
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        Ok(Self::new(&captures[1], git_ref))
    }

    /// The explicit ref, or else the ambient branch.
    pub fn resolve_ref(&self, ambient: &AmbientBranch) -> Result<String> {
        self.git_ref
            .clone()
            .or_else(|| ambient.get().map(str::to_string))
            .ok_or_else(|| Error::InvalidLocator {
                locator: self.to_string(),
                message: format!(
                    "no #<ref> given and no ambient branch ({}, {} or current checkout)",
                    ENV_BRANCH, ENV_CI_REF
                ),
            })
    }
}

impl fmt::Display for GitReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", PACKAGE_SCHEME, self.url)?;
        if let Some(git_ref) = &self.git_ref {
            write!(f, "#{}", git_ref)?;
        }
        Ok(())
    }
}

/// The branch used for references without an explicit ref.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmbientBranch(Option<String>);

impl AmbientBranch {
    pub fn new(branch: Option<String>) -> Self {
        Self(branch)
    }

    /// Resolves from the environment, falling back to the branch checked out
    /// in `checkout`.
    pub fn from_env(checkout: &Path) -> Self {
        Self(pick_branch(
            std::env::var(ENV_BRANCH).ok(),
            std::env::var(ENV_CI_REF).ok(),
            || git::current_branch(checkout).ok(),
        ))
    }

    pub fn get(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// Explicit override first, then the CI ref, then the current checkout.
/// Empty values count as unset.
pub fn pick_branch<F>(explicit: Option<String>, ci_ref: Option<String>, current: F) -> Option<String>
where
    F: FnOnce() -> Option<String>,
{
    let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());
    non_empty(explicit)
        .or_else(|| non_empty(ci_ref))
        .or_else(|| non_empty(current()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reference_with_ref() {
        let reference = GitReference::parse("polyrepo+https://host/group/repo.git#feature-x").unwrap();
        assert_eq!(reference.url, "https://host/group/repo.git");
        assert_eq!(reference.git_ref.as_deref(), Some("feature-x"));
    }

    #[test]
    fn test_parse_reference_without_ref_uses_ambient() {
        let reference = GitReference::parse("polyrepo+https://host/group/repo.git").unwrap();
        assert_eq!(reference.url, "https://host/group/repo.git");
        assert_eq!(reference.git_ref, None);

        let ambient = AmbientBranch::new(Some("develop".to_string()));
        assert_eq!(reference.resolve_ref(&ambient).unwrap(), "develop");
    }

    #[test]
    fn test_parse_reference_empty_ref_is_absent() {
        let reference = GitReference::parse("polyrepo+git@host:g/r.git#").unwrap();
        assert_eq!(reference.git_ref, None);
    }

    #[test]
    fn test_parse_reference_rejects_other_schemes() {
        assert!(GitReference::parse("^1.2.3").is_err());
        assert!(GitReference::parse("git+https://host/r.git").is_err());
        assert!(GitReference::parse("polyrepo+").is_err());
    }

    #[test]
    fn test_resolve_ref_without_any_branch_fails() {
        let reference = GitReference::parse("polyrepo+git@host:g/r.git").unwrap();
        let err = reference.resolve_ref(&AmbientBranch::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidLocator { .. }));
    }

    #[test]
    fn test_normalize_fills_in_branch() {
        let locator = Locator::new(
            PackageIdent::parse("@shared/ui").unwrap(),
            "polyrepo+git@host:g/ui.git",
        );
        let ambient = AmbientBranch::new(Some("main".to_string()));

        let normalized = locator.normalize(&ambient).unwrap();
        assert_eq!(normalized.reference, "polyrepo+git@host:g/ui.git#main");

        // Explicit refs are kept
        let pinned = Locator::new(locator.ident.clone(), "polyrepo+git@host:g/ui.git#v2");
        assert_eq!(pinned.normalize(&ambient).unwrap(), pinned);
    }

    #[test]
    fn test_ident_forms() {
        let scoped = PackageIdent::parse("@shared/ui").unwrap();
        assert_eq!(scoped.to_string(), "@shared/ui");
        assert_eq!(scoped.slug(), "@shared-ui");
        assert_eq!(scoped.vendor_path(), Path::new("node_modules/@shared/ui"));

        let plain = PackageIdent::parse("lodash").unwrap();
        assert_eq!(plain.scope, None);
        assert_eq!(plain.vendor_path(), Path::new("node_modules/lodash"));

        assert!(PackageIdent::parse("@scope").is_err());
        assert!(PackageIdent::parse("").is_err());
        assert!(PackageIdent::parse("a/b").is_err());
    }

    #[test]
    fn test_descriptor_parse_splits_after_scope() {
        let descriptor = Descriptor::parse("@shared/ui@polyrepo+git@host:g/ui.git#dev").unwrap();
        assert_eq!(descriptor.ident.to_string(), "@shared/ui");
        assert_eq!(descriptor.range, "polyrepo+git@host:g/ui.git#dev");
        assert!(supports_range(&descriptor.range));

        let plain = Descriptor::parse("left-pad@^1.0.0").unwrap();
        assert_eq!(plain.ident.name, "left-pad");
        assert!(!supports_range(&plain.range));

        assert!(Descriptor::parse("@shared/ui").is_err());
    }

    #[test]
    fn test_candidate_carries_descriptor_range() {
        let descriptor = Descriptor::parse("app@polyrepo+https://h/g/app.git#x").unwrap();
        let locator = Locator::from_descriptor(&descriptor);
        assert_eq!(locator.reference, descriptor.range);
        assert_eq!(locator.ident, descriptor.ident);
    }

    #[test]
    fn test_pick_branch_priority() {
        let some = |s: &str| Some(s.to_string());
        assert_eq!(pick_branch(some("a"), some("b"), || some("c")), some("a"));
        assert_eq!(pick_branch(None, some("b"), || some("c")), some("b"));
        assert_eq!(pick_branch(some(""), None, || some("c")), some("c"));
        assert_eq!(pick_branch(None, None, || None), None);
    }

    #[test]
    fn test_pick_branch_does_not_query_git_when_set() {
        let branch = pick_branch(Some("a".to_string()), None, || panic!("git queried"));
        assert_eq!(branch.as_deref(), Some("a"));
    }
}
