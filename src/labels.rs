//! # Label Expressions
//!
//! Operators pick the repositories a command acts on with label expressions.
//! An expression is a list of OR-groups; each group is a `+` or `&` joined
//! list of conditions that must all hold:
//!
//! - `back+shared` selects repositories on side `back` in scope `shared`.
//! - `ui-client` selects anything whose name, side, scope or package is
//!   `ui-client`.
//! - `name:shared` selects only the repository *named* `shared`.
//!
//! A condition is a bare value (matching any of name, side, scope or package)
//! or a `key:value` pair restricted to one attribute. Unknown keys are kept as
//! bare values and simply never match, since labels are free-form strings.

use std::fmt;

use crate::catalog::RepositoryDescriptor;

/// The repository attribute a condition is tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// A bare value: name, side, scope or package.
    Any,
    Name,
    Side,
    Scope,
    Package,
}

impl Attribute {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "name" => Some(Self::Name),
            "side" => Some(Self::Side),
            "scope" => Some(Self::Scope),
            "package" => Some(Self::Package),
            _ => None,
        }
    }

    fn key(self) -> Option<&'static str> {
        match self {
            Self::Any => None,
            Self::Name => Some("name"),
            Self::Side => Some("side"),
            Self::Scope => Some("scope"),
            Self::Package => Some("package"),
        }
    }
}

/// A single `attribute == value` test.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Condition {
    pub attribute: Attribute,
    pub value: String,
}

impl Condition {
    pub fn new(attribute: Attribute, value: impl Into<String>) -> Self {
        Self {
            attribute,
            value: value.into(),
        }
    }

    /// Parses `key:value` or a bare value.
    pub fn parse(token: &str) -> Self {
        if let Some((key, value)) = token.split_once(':') {
            if let Some(attribute) = Attribute::from_key(key) {
                return Self::new(attribute, value);
            }
        }
        Self::new(Attribute::Any, token)
    }

    pub fn matches(&self, repo: &RepositoryDescriptor) -> bool {
        let value = self.value.as_str();
        let package = repo.package_name.as_deref() == Some(value);
        match self.attribute {
            Attribute::Any => repo.name == value || repo.side == value || repo.scope == value || package,
            Attribute::Name => repo.name == value,
            Attribute::Side => repo.side == value,
            Attribute::Scope => repo.scope == value,
            Attribute::Package => package,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.attribute.key() {
            Some(key) => write!(f, "{}:{}", key, self.value),
            None => f.write_str(&self.value),
        }
    }
}

/// Conditions joined with AND.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelGroup {
    conditions: Vec<Condition>,
}

impl LabelGroup {
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }

    /// Parses a `+` or `&` separated list of conditions.
    ///
    /// Empty tokens are kept so that a stray separator never widens a group.
    pub fn parse(group: &str) -> Self {
        Self::new(group.split(['+', '&']).map(Condition::parse).collect())
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn matches(&self, repo: &RepositoryDescriptor) -> bool {
        self.conditions.iter().all(|condition| condition.matches(repo))
    }
}

impl fmt::Display for LabelGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.conditions.iter().map(|c| c.to_string()).collect();
        f.write_str(&parts.join("+"))
    }
}

/// OR of AND-groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelExpression {
    groups: Vec<LabelGroup>,
}

impl LabelExpression {
    pub fn new(groups: Vec<LabelGroup>) -> Self {
        Self { groups }
    }

    /// Builds an expression from repeated command-line values.
    pub fn parse<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(values.into_iter().map(|v| LabelGroup::parse(v.as_ref())).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn groups(&self) -> &[LabelGroup] {
        &self.groups
    }

    /// True if any group matches. An empty expression matches nothing.
    pub fn matches(&self, repo: &RepositoryDescriptor) -> bool {
        self.groups.iter().any(|group| group.matches(repo))
    }
}

impl From<LabelGroup> for LabelExpression {
    fn from(group: LabelGroup) -> Self {
        Self::new(vec![group])
    }
}

/// Label values a repository answers to, as shown in help output.
pub fn repo_conditions(repo: &RepositoryDescriptor) -> Vec<String> {
    let attributes = [
        ("name", Some(repo.name.as_str())),
        ("side", Some(repo.side.as_str())),
        ("scope", Some(repo.scope.as_str())),
        ("package", repo.package_name.as_deref()),
    ];

    let mut conditions = Vec::new();
    for (key, value) in attributes {
        if let Some(value) = value {
            conditions.push(value.to_string());
            conditions.push(format!("{}:{}", key, value));
        }
    }
    conditions
}

/// Keeps repositories selected by `only` (everything when empty) and not
/// matched by `exclude`, preserving order.
pub fn filter<'a>(
    repos: &'a [RepositoryDescriptor],
    only: &LabelExpression,
    exclude: &LabelExpression,
) -> Vec<&'a RepositoryDescriptor> {
    repos
        .iter()
        .filter(|repo| only.is_empty() || only.matches(repo))
        .filter(|repo| !exclude.matches(repo))
        .collect()
}
