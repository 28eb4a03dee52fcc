//! Property-based tests for catalog flattening and label filtering.
//!
//! These tests use proptest to generate random catalog trees and label
//! expressions and verify that invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::catalog::{flatten, CatalogTree, RepoSpec, RepositoryDescriptor, ScopeNode, SideNode};
    use crate::labels::{filter, repo_conditions, LabelExpression};
    use proptest::prelude::*;
    use std::collections::HashSet;

    const LABELS: &[&str] = &[
        "front", "back", "modules", "shared", "ui", "api", "name:ui", "side:back", "scope:shared",
        "package:@shared", "missing",
    ];

    /// Trees with up to 3 sides, 3 scopes per side and 4 repositories per
    /// scope. Repository names are numbered so they stay unique.
    fn tree_strategy() -> impl Strategy<Value = CatalogTree> {
        let scopes = prop::collection::vec(0usize..4, 1..4);
        prop::collection::vec(scopes, 1..4).prop_map(|sides| {
            let mut counter = 0;
            let side_names = ["front", "back", "ops"];
            let scope_names = ["modules", "shared", "tools"];
            let nodes = sides
                .into_iter()
                .enumerate()
                .map(|(s, scopes)| SideNode {
                    name: side_names[s].to_string(),
                    scopes: scopes
                        .into_iter()
                        .enumerate()
                        .map(|(c, count)| ScopeNode {
                            name: scope_names[c].to_string(),
                            repos: (0..count)
                                .map(|_| {
                                    counter += 1;
                                    let name = if counter == 3 {
                                        "ui".to_string()
                                    } else {
                                        format!("repo-{}", counter)
                                    };
                                    let spec = RepoSpec {
                                        package: (counter % 2 == 0).then(|| "@shared".to_string()),
                                        url: format!("https://git.example.com/{}.git", name),
                                        requires: Vec::new(),
                                    };
                                    (name, spec)
                                })
                                .collect(),
                        })
                        .collect(),
                })
                .collect();
            CatalogTree::new(nodes)
        })
    }

    fn expression_strategy() -> impl Strategy<Value = Vec<String>> {
        let group = prop::collection::vec(prop::sample::select(LABELS), 1..3).prop_map(|c| c.join("+"));
        prop::collection::vec(group, 0..3)
    }

    fn leaf_count(tree: &CatalogTree) -> usize {
        tree.sides()
            .iter()
            .flat_map(|side| &side.scopes)
            .map(|scope| scope.repos.len())
            .sum()
    }

    /// Reference semantics: a group matches when all its conditions are in
    /// the repository's condition set.
    fn matches_by_condition_set(repo: &RepositoryDescriptor, values: &[String]) -> bool {
        let set: HashSet<String> = repo_conditions(repo).into_iter().collect();
        values
            .iter()
            .any(|group| group.split(['+', '&']).all(|c| set.contains(c)))
    }

    proptest! {
        /// Property: one descriptor per leaf, uri = side/scope/name, uris unique
        #[test]
        fn flatten_yields_one_descriptor_per_leaf(tree in tree_strategy()) {
            let repos = flatten(&tree);
            prop_assert_eq!(repos.len(), leaf_count(&tree));

            let mut uris = HashSet::new();
            for repo in &repos {
                prop_assert_eq!(&repo.uri, &format!("{}/{}/{}", repo.side, repo.scope, repo.name));
                prop_assert!(uris.insert(repo.uri.clone()), "duplicate uri {}", repo.uri);
            }
        }

        /// Property: empty only and exclude keep every repository in order
        #[test]
        fn empty_filter_is_identity(tree in tree_strategy()) {
            let repos = flatten(&tree);
            let empty = LabelExpression::default();
            let kept: Vec<_> = filter(&repos, &empty, &empty).into_iter().cloned().collect();
            prop_assert_eq!(kept, repos);
        }

        /// Property: matching agrees with the condition-set definition
        #[test]
        fn matches_agrees_with_condition_set(tree in tree_strategy(), values in expression_strategy()) {
            let expression = LabelExpression::parse(&values);
            for repo in flatten(&tree) {
                prop_assert_eq!(
                    expression.matches(&repo),
                    matches_by_condition_set(&repo, &values),
                    "expression {:?} on {}",
                    values,
                    repo.uri
                );
            }
        }

        /// Property: an empty expression never matches
        #[test]
        fn empty_expression_matches_nothing(tree in tree_strategy()) {
            let empty = LabelExpression::default();
            for repo in flatten(&tree) {
                prop_assert!(!empty.matches(&repo));
            }
        }

        /// Property: filtered repositories satisfy only and avoid exclude,
        /// and the result is an order-preserving subsequence
        #[test]
        fn filter_respects_only_and_exclude(
            tree in tree_strategy(),
            only in expression_strategy(),
            exclude in expression_strategy(),
        ) {
            let repos = flatten(&tree);
            let only = LabelExpression::parse(&only);
            let exclude = LabelExpression::parse(&exclude);
            let kept = filter(&repos, &only, &exclude);

            let expected: Vec<_> = repos
                .iter()
                .filter(|r| (only.is_empty() || only.matches(r)) && !exclude.matches(r))
                .collect();
            prop_assert_eq!(kept, expected);
        }
    }
}
