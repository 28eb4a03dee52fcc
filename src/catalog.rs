//! # Repository Catalog
//!
//! The catalog is the declarative tree of every repository the workspace knows
//! about, grouped `side -> scope -> name`. Each leaf names the git remote, the
//! package name the repository is imported as, and the selectors of the
//! repositories it requires:
//!
//! ```yaml
//! front:
//!   modules:
//!     ui-admin:
//!       package: "@polyrepo/ui-admin"
//!       url: git+ssh://git@gitlab.com/polyrepo/ui-admin.git
//!       requires: ["name:shared-ui"]
//!   shared:
//!     shared-ui:
//!       package: "@shared"
//!       url: git+ssh://git@gitlab.com/polyrepo/ui-shared.git
//! ```
//!
//! [`flatten`] turns the tree into a list of [`RepositoryDescriptor`]s in
//! declaration order, deriving each descriptor's `uri` (`side/scope/name`), the
//! path of its working copy relative to the workspace root.
//!
//! A catalog compiled into the binary is used unless a catalog file is given.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};
use crate::labels::{LabelExpression, LabelGroup};

const BUILTIN_CATALOG: &str = include_str!("catalog.yaml");

/// Attributes of a single repository leaf in the catalog tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepoSpec {
    /// Name the repository is imported as by its dependents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    /// Git remote of the repository.
    pub url: String,
    /// Selectors (`key:value` or bare values) of required repositories.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,
}

/// A scope grouping inside a side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeNode {
    pub name: String,
    pub repos: Vec<(String, RepoSpec)>,
}

/// A top-level side grouping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideNode {
    pub name: String,
    pub scopes: Vec<ScopeNode>,
}

/// The hierarchical catalog, with declaration order preserved at every level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogTree {
    sides: Vec<SideNode>,
}

impl CatalogTree {
    /// Builds a tree from already-parsed nodes.
    pub fn new(sides: Vec<SideNode>) -> Self {
        Self { sides }
    }

    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_CATALOG)
    }

    /// Reads and parses a catalog file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parses a YAML catalog.
    ///
    /// Every level must be a mapping with string keys. A scope may be empty
    /// (`scope: {}` or `scope:`). Repository names must be unique across the
    /// whole catalog and must be usable as a single path component.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let root: Value = serde_yaml::from_str(content)?;
        let mut seen = HashSet::new();
        let mut sides = Vec::new();

        for (side, scopes) in entries(&root, "catalog")? {
            check_component(&side, "side")?;
            let mut side_node = SideNode {
                name: side.clone(),
                scopes: Vec::new(),
            };

            for (scope, repos) in entries(scopes, &side)? {
                check_component(&scope, "scope")?;
                let mut scope_node = ScopeNode {
                    name: scope.clone(),
                    repos: Vec::new(),
                };

                for (name, attributes) in entries(repos, &format!("{}/{}", side, scope))? {
                    check_component(&name, "repository")?;
                    if !seen.insert(name.clone()) {
                        return Err(Error::CatalogParse {
                            message: format!("Repository name '{}' is declared more than once", name),
                            hint: Some("Repository names must be unique across all sides and scopes".to_string()),
                        });
                    }

                    let spec: RepoSpec =
                        serde_yaml::from_value(attributes.clone()).map_err(|e| Error::CatalogParse {
                            message: format!("Invalid repository '{}/{}/{}': {}", side, scope, name, e),
                            hint: Some("Each repository needs a 'url' and may declare 'package' and 'requires'".to_string()),
                        })?;
                    if let Some(package) = &spec.package {
                        check_package(package)?;
                    }
                    scope_node.repos.push((name, spec));
                }

                side_node.scopes.push(scope_node);
            }

            sides.push(side_node);
        }

        Ok(Self { sides })
    }

    /// Top-level sides in declaration order.
    pub fn sides(&self) -> &[SideNode] {
        &self.sides
    }
}

/// Iterates a mapping level of the catalog; `null` counts as empty.
fn entries<'a>(value: &'a Value, location: &str) -> Result<Vec<(String, &'a Value)>> {
    let mapping: &Mapping = match value {
        Value::Mapping(mapping) => mapping,
        Value::Null => return Ok(Vec::new()),
        _ => {
            return Err(Error::CatalogParse {
                message: format!("Expected a mapping at '{}'", location),
                hint: Some("The catalog is nested as side -> scope -> name -> attributes".to_string()),
            })
        }
    };

    mapping
        .iter()
        .map(|(key, value)| match key {
            Value::String(key) => Ok((key.clone(), value)),
            other => Err(Error::CatalogParse {
                message: format!("Non-string key {:?} at '{}'", other, location),
                hint: None,
            }),
        })
        .collect()
}

/// Checks that `package` names a module directory: `name`, `@scope` or
/// `@scope/name`. The value becomes a path under `node_modules`, so `.`,
/// `..`, empty segments and backslashes are rejected.
pub fn check_package(package: &str) -> Result<()> {
    let segments: Vec<&str> = package.split('/').collect();
    let valid_segment = |segment: &&str| {
        !segment.is_empty() && *segment != "." && *segment != ".." && !segment.contains('\\')
    };
    let valid = match segments.as_slice() {
        [name] => valid_segment(name),
        [scope, name] => scope.starts_with('@') && scope.len() > 1 && valid_segment(scope) && valid_segment(name),
        _ => false,
    };

    if !valid {
        return Err(Error::CatalogParse {
            message: format!("Invalid package name '{}'", package),
            hint: Some("Use a package name such as 'name', '@scope' or '@scope/name'".to_string()),
        });
    }
    Ok(())
}

fn check_component(value: &str, kind: &str) -> Result<()> {
    if value.is_empty() || value.contains(['/', '\\']) || value == "." || value == ".." {
        return Err(Error::CatalogParse {
            message: format!("Invalid {} name '{}'", kind, value),
            hint: Some("Names become directory names and cannot contain path separators".to_string()),
        });
    }
    Ok(())
}

impl Serialize for CatalogTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        struct Scopes<'a>(&'a [ScopeNode]);
        struct Repos<'a>(&'a [(String, RepoSpec)]);

        impl Serialize for Scopes<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for scope in self.0 {
                    map.serialize_entry(&scope.name, &Repos(&scope.repos))?;
                }
                map.end()
            }
        }

        impl Serialize for Repos<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for (name, spec) in self.0 {
                    map.serialize_entry(name, spec)?;
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(self.sides.len()))?;
        for side in &self.sides {
            map.serialize_entry(&side.name, &Scopes(&side.scopes))?;
        }
        map.end()
    }
}

/// One repository of the workspace, as flattened from the catalog tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryDescriptor {
    pub name: String,
    pub side: String,
    pub scope: String,
    /// `side/scope/name`, the working copy path relative to the root.
    pub uri: String,
    /// Name the repository is imported as, if it is importable.
    #[serde(rename = "package")]
    pub package_name: Option<String>,
    pub url: String,
    pub requires: Vec<String>,
}

impl RepositoryDescriptor {
    /// Absolute location of the working copy under `root`.
    pub fn local_path(&self, root: &Path) -> PathBuf {
        root.join(&self.side).join(&self.scope).join(&self.name)
    }

    /// The `requires` selectors, each parsed as a single AND-group.
    pub fn requirements(&self) -> impl Iterator<Item = (&str, LabelGroup)> + '_ {
        self.requires
            .iter()
            .map(|selector| (selector.as_str(), LabelGroup::parse(selector)))
    }
}

/// Flattens the catalog tree into one descriptor per leaf, in declaration order.
pub fn flatten(tree: &CatalogTree) -> Vec<RepositoryDescriptor> {
    let mut repos = Vec::new();
    for side in tree.sides() {
        for scope in &side.scopes {
            for (name, spec) in &scope.repos {
                repos.push(RepositoryDescriptor {
                    name: name.clone(),
                    side: side.name.clone(),
                    scope: scope.name.clone(),
                    uri: [side.name.as_str(), scope.name.as_str(), name.as_str()].join("/"),
                    package_name: spec.package.clone(),
                    url: spec.url.clone(),
                    requires: spec.requires.clone(),
                });
            }
        }
    }
    repos
}

/// The flattened catalog together with the tree it came from.
#[derive(Debug, Clone)]
pub struct Catalog {
    tree: CatalogTree,
    repos: Vec<RepositoryDescriptor>,
}

impl Catalog {
    pub fn from_tree(tree: CatalogTree) -> Self {
        let repos = flatten(&tree);
        Self { tree, repos }
    }

    /// Loads the catalog from `path`, or the built-in catalog when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let tree = match path {
            Some(path) => CatalogTree::from_file(path)?,
            None => CatalogTree::builtin()?,
        };
        Ok(Self::from_tree(tree))
    }

    pub fn tree(&self) -> &CatalogTree {
        &self.tree
    }

    pub fn repos(&self) -> &[RepositoryDescriptor] {
        &self.repos
    }

    pub fn get(&self, name: &str) -> Option<&RepositoryDescriptor> {
        self.repos.iter().find(|repo| repo.name == name)
    }

    /// Repositories selected by `only` and not matched by `exclude`.
    pub fn filter(&self, only: &LabelExpression, exclude: &LabelExpression) -> Vec<&RepositoryDescriptor> {
        crate::labels::filter(&self.repos, only, exclude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"
front:
  modules:
    app:
      package: "@org/app"
      url: https://git.example.com/org/app.git
      requires: ["name:lib"]
  shared:
    lib:
      package: "@org/lib"
      url: https://git.example.com/org/lib.git
back:
  modules: {}
  shared:
"#;

    #[test]
    fn test_flatten_one_descriptor_per_leaf() {
        let tree = CatalogTree::from_yaml(SMALL).unwrap();
        let repos = flatten(&tree);

        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0].name, "app");
        assert_eq!(repos[0].uri, "front/modules/app");
        assert_eq!(repos[0].requires, vec!["name:lib".to_string()]);
        assert_eq!(repos[1].uri, "front/shared/lib");
        assert!(repos[1].requires.is_empty());
    }

    #[test]
    fn test_flatten_preserves_declaration_order() {
        let yaml = r#"
zeta:
  b:
    second: { url: u2 }
    first: { url: u1 }
alpha:
  a:
    third: { url: u3 }
"#;
        let repos = flatten(&CatalogTree::from_yaml(yaml).unwrap());
        let names: Vec<_> = repos.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["second", "first", "third"]);
    }

    #[test]
    fn test_builtin_catalog_parses() {
        let catalog = Catalog::load(None).unwrap();
        assert!(!catalog.repos().is_empty());
        let shared_ui = catalog.get("shared-ui").unwrap();
        assert_eq!(shared_ui.uri, "front/shared/shared-ui");
        assert_eq!(shared_ui.package_name.as_deref(), Some("@shared"));

        let uris: HashSet<_> = catalog.repos().iter().map(|r| r.uri.clone()).collect();
        assert_eq!(uris.len(), catalog.repos().len());
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let yaml = r#"
front:
  modules:
    dup: { url: a }
back:
  modules:
    dup: { url: b }
"#;
        let err = CatalogTree::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("declared more than once"));
    }

    #[test]
    fn test_missing_url_is_rejected() {
        let yaml = "front:\n  modules:\n    app:\n      package: x\n";
        let err = CatalogTree::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, Error::CatalogParse { .. }));
        assert!(err.to_string().contains("front/modules/app"));
    }

    #[test]
    fn test_non_mapping_level_is_rejected() {
        let err = CatalogTree::from_yaml("front: [a, b]").unwrap_err();
        assert!(err.to_string().contains("Expected a mapping at 'front'"));
    }

    #[test]
    fn test_path_separator_in_name_is_rejected() {
        let err = CatalogTree::from_yaml("front:\n  modules:\n    a/b: { url: u }\n").unwrap_err();
        assert!(err.to_string().contains("Invalid repository name"));
    }

    #[test]
    fn test_package_escaping_node_modules_is_rejected() {
        for package in ["..", ".", "", "@org/..", "../app", "a/b", "@org/x/y", "@/x", "@org\\\\x"] {
            let yaml = format!("front:\n  shared:\n    lib: {{ package: \"{}\", url: u }}\n", package);
            let err = CatalogTree::from_yaml(&yaml).unwrap_err();
            assert!(err.to_string().contains("Invalid package name"), "{:?}", package);
        }
    }

    #[test]
    fn test_package_forms_are_accepted() {
        for package in ["lib", "@shared", "@org/lib", "@org/lib.js"] {
            assert!(check_package(package).is_ok(), "{}", package);
        }
    }

    #[test]
    fn test_local_path_joins_components() {
        let repos = flatten(&CatalogTree::from_yaml(SMALL).unwrap());
        let path = repos[0].local_path(Path::new("/work"));
        assert_eq!(path, Path::new("/work").join("front").join("modules").join("app"));
    }

    #[test]
    fn test_tree_serializes_in_order() {
        let tree = CatalogTree::from_yaml(SMALL).unwrap();
        let json = serde_json::to_string(&tree).unwrap();
        let front = json.find("\"front\"").unwrap();
        let back = json.find("\"back\"").unwrap();
        assert!(front < back);
        assert!(json.contains("\"requires\":[\"name:lib\"]"));
    }
}
