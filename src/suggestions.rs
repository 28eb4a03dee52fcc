//! # Error Suggestions
//!
//! Helper functions for user-facing errors that say what went wrong AND how
//! to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use polyrepo::suggestions;
//!
//! let root = find_root(&path).map_err(|_| suggestions::root_not_found(&path))?;
//! ```

use std::path::Path;

use crate::defaults::{PACKAGE_SCHEME, ROOT_FILE_NAME};

/// Generate an error for when no workspace root is found.
///
/// Includes hints about:
/// - Marking a directory with `polyrepo mark`
/// - Using the -p/--path flag
pub fn root_not_found(start: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Project root is not found in {start} and above\n\n\
         hint: Run 'polyrepo mark' in the workspace directory to create {ROOT_FILE_NAME}\n\
         hint: Use -p/--path to search from a different directory",
        start = start.display()
    )
}

/// Generate an error for a catalog file that cannot be loaded.
pub fn catalog_unreadable(path: &Path, error: &crate::error::Error) -> anyhow::Error {
    anyhow::anyhow!(
        "Failed to load catalog from {path}\n\
         error: {error}\n\n\
         hint: The catalog maps side -> scope -> name -> {{package, url, requires}}\n\
         hint: Omit --catalog (or unset POLYREPO_CATALOG) to use the built-in catalog",
        path = path.display()
    )
}

/// Generate an error for a package descriptor that cannot be parsed.
pub fn invalid_descriptor(descriptor: &str, error: &crate::error::Error) -> anyhow::Error {
    anyhow::anyhow!(
        "Invalid package descriptor: {descriptor}\n\
         error: {error}\n\n\
         hint: Descriptors look like <name>@{PACKAGE_SCHEME}<git-url>[#<ref>]\n\
         hint: Example: @shared/ui@{PACKAGE_SCHEME}git@gitlab.com:group/shared-ui.git#develop"
    )
}

/// Generate an error for a missing yarn template directory.
pub fn template_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Yarn template directory not found: {path}\n\n\
         hint: Use --template to point at a directory holding .yarn/ and .yarnrc.yml\n\
         hint: Set POLYREPO_YARN_TEMPLATE environment variable",
        path = path.display()
    )
}

/// Generate an error for a selection that matched no repository.
///
/// Includes the closest repository name when one is near the given label.
pub fn nothing_selected(only: &[String], names: &[&str]) -> anyhow::Error {
    let did_you_mean = only
        .iter()
        .find_map(|label| find_similar(label, names))
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "No repository matches --only {labels}{did_you_mean}\n\n\
         hint: Run 'polyrepo tree' to list sides, scopes and names",
        labels = only.join(" ")
    )
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    // Single-row dynamic programming
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut current = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        previous = current;
    }
    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_root_not_found_includes_hints() {
        let message = root_not_found(Path::new("/work/dir")).to_string();

        assert!(message.contains("Project root is not found in /work/dir"));
        assert!(message.contains("polyrepo mark"));
        assert!(message.contains("-p/--path"));
    }

    #[test]
    fn test_catalog_unreadable_includes_cause() {
        let error = Error::CatalogParse {
            message: "bad".to_string(),
            hint: None,
        };
        let message = catalog_unreadable(Path::new("repos.yaml"), &error).to_string();

        assert!(message.contains("repos.yaml"));
        assert!(message.contains("Catalog parsing error: bad"));
        assert!(message.contains("POLYREPO_CATALOG"));
    }

    #[test]
    fn test_invalid_descriptor_shows_grammar() {
        let error = Error::InvalidLocator {
            locator: "x".to_string(),
            message: "missing range".to_string(),
        };
        let message = invalid_descriptor("x", &error).to_string();

        assert!(message.contains("Invalid package descriptor: x"));
        assert!(message.contains("polyrepo+<git-url>[#<ref>]"));
    }

    #[test]
    fn test_nothing_selected_suggests_similar() {
        let message =
            nothing_selected(&["ui-admn".to_string()], &["ui-admin", "api-gateway"]).to_string();
        assert!(message.contains("Did you mean 'ui-admin'?"));

        let message = nothing_selected(&["zzz".to_string()], &["ui-admin"]).to_string();
        assert!(!message.contains("Did you mean"));
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("front", "front"), 0);
        assert_eq!(edit_distance("fron", "front"), 1);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("shared", "scared"), 1);
        assert_eq!(edit_distance("back", "front"), 5);
    }
}
