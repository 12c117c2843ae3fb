//! Listing selection and diagnostics
//!
//! Applies the item pattern to a source listing. Files are selected by the
//! pattern; folders are kept when they match or when a selected file lives
//! below them. Listing order is preserved and never repaired: a duplicate
//! path keeps its first entry and a file listed ahead of its folder is only
//! reported.

use artifact_types::{ArtifactItem, PatternSet};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Items selected from a listing plus what was dropped or flagged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Items to transfer, in listing order
    pub items: Vec<ArtifactItem>,
    /// Items dropped by the pattern
    pub excluded: usize,
    /// Repeated paths dropped from the listing
    pub duplicates: usize,
    /// Items listed before their parent folder
    pub out_of_order: usize,
}

/// Select the items of a listing that a run should transfer
pub fn select_items(listing: Vec<ArtifactItem>, patterns: &PatternSet) -> Selection {
    let mut selection = Selection::default();

    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(listing.len());
    for item in listing {
        if seen.insert(item.path().to_string()) {
            unique.push(item);
        } else {
            warn!(path = %item.path(), "Duplicate path in listing, keeping the first entry");
            selection.duplicates += 1;
        }
    }

    selection.out_of_order = check_listing_order(&unique);

    if patterns.is_match_all() {
        selection.items = unique;
        return selection;
    }

    let needed_folders: HashSet<&str> = unique
        .iter()
        .filter(|item| item.is_file() && patterns.is_match(item.path()))
        .flat_map(ArtifactItem::ancestors)
        .collect();

    let keep: Vec<bool> = unique
        .iter()
        .map(|item| {
            patterns.is_match(item.path())
                || (item.is_folder() && needed_folders.contains(item.path()))
        })
        .collect();

    for (item, keep) in unique.into_iter().zip(keep) {
        if keep {
            selection.items.push(item);
        } else {
            debug!(path = %item.path(), "Excluded by item pattern");
            selection.excluded += 1;
        }
    }

    selection
}

/// Count items whose parent folder is listed after them
fn check_listing_order(items: &[ArtifactItem]) -> usize {
    let folder_positions: HashMap<&str, usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.is_folder())
        .map(|(idx, item)| (item.path(), idx))
        .collect();

    items
        .iter()
        .enumerate()
        .filter(|(idx, item)| {
            let late_parent = item
                .parent()
                .and_then(|parent| folder_positions.get(parent))
                .is_some_and(|&parent_idx| parent_idx > *idx);
            if late_parent {
                warn!(
                    path = %item.path(),
                    "Item listed before its parent folder; destination may need the folder first"
                );
            }
            late_parent
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn listing() -> Vec<ArtifactItem> {
        vec![
            ArtifactItem::file("a.txt", 10),
            ArtifactItem::folder("dir"),
            ArtifactItem::file("dir/b.txt", 20),
            ArtifactItem::folder("dir/sub"),
            ArtifactItem::file("dir/sub/c.log", 5),
            ArtifactItem::folder("empty"),
        ]
    }

    fn paths(selection: &Selection) -> Vec<&str> {
        selection.items.iter().map(ArtifactItem::path).collect()
    }

    #[test]
    fn test_match_all_keeps_everything() {
        let selection = select_items(listing(), &PatternSet::match_all());
        assert_eq!(selection.items.len(), 6);
        assert_eq!(selection.excluded, 0);
        assert_eq!(selection.out_of_order, 0);
    }

    #[test]
    fn test_ancestor_folders_kept() {
        let patterns = PatternSet::parse("**/*.log").unwrap();
        let selection = select_items(listing(), &patterns);

        assert_eq!(paths(&selection), vec!["dir", "dir/sub", "dir/sub/c.log"]);
        assert_eq!(selection.excluded, 3);
    }

    #[rstest]
    #[case("*.txt", &["a.txt"])]
    #[case("dir/*", &["dir", "dir/b.txt", "dir/sub"])]
    #[case("**/b.*", &["dir", "dir/b.txt"])]
    #[case("missing/**", &[])]
    fn test_pattern_selection(#[case] pattern: &str, #[case] expected: &[&str]) {
        let selection = select_items(listing(), &PatternSet::parse(pattern).unwrap());
        assert_eq!(paths(&selection), expected);
    }

    #[test]
    fn test_exclusions_apply_to_files() {
        let patterns = PatternSet::parse("**\n!**/*.log").unwrap();
        let selection = select_items(listing(), &patterns);

        assert!(!paths(&selection).contains(&"dir/sub/c.log"));
        assert!(paths(&selection).contains(&"dir/sub"));
        assert!(paths(&selection).contains(&"empty"));
    }

    #[test]
    fn test_duplicates_and_order_are_reported() {
        let selection = select_items(
            vec![
                ArtifactItem::file("dir/b.txt", 20),
                ArtifactItem::folder("dir"),
                ArtifactItem::file("dir\\b.txt", 20),
            ],
            &PatternSet::match_all(),
        );

        assert_eq!(paths(&selection), vec!["dir/b.txt", "dir"]);
        assert_eq!(selection.duplicates, 1);
        assert_eq!(selection.out_of_order, 1);
    }

    proptest! {
        #[test]
        fn test_selection_is_ordered_subset(names in proptest::collection::vec("[a-c]{1,2}(/[a-c]{1,2}){0,2}", 0..20)) {
            let items: Vec<ArtifactItem> = names.iter().map(|name| ArtifactItem::file(name, 1)).collect();
            let patterns = PatternSet::parse("**/a*").unwrap();
            let selection = select_items(items.clone(), &patterns);

            let mut cursor = items.iter();
            for kept in &selection.items {
                prop_assert!(cursor.any(|item| item == kept));
            }
            prop_assert_eq!(
                selection.items.len() + selection.excluded + selection.duplicates,
                items.len()
            );
        }
    }
}
