//! Slug derivation for file names, anchors and diagram node ids

use std::collections::HashMap;

/// Turn arbitrary text into a lowercase, `-`-separated token.
///
/// Every maximal run of characters outside `[a-z0-9]` (after lowercasing)
/// collapses into a single `-`; leading and trailing separators are
/// dropped. Distinct inputs may share a slug.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }

    slug
}

/// Group names that map to the same slug.
///
/// Returns `(slug, names)` pairs for every slug produced by two or more
/// names, in first-seen order. Repeated names count as collisions too, and
/// each occurrence is listed.
pub fn find_collisions<'a>(
    names: impl IntoIterator<Item = &'a str>,
) -> Vec<(String, Vec<String>)> {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for name in names {
        let slug = slugify(name);
        match index.get(&slug) {
            Some(&position) => groups[position].1.push(name.to_string()),
            None => {
                index.insert(slug.clone(), groups.len());
                groups.push((slug, vec![name.to_string()]));
            }
        }
    }

    groups.retain(|(_, members)| members.len() > 1);
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Checkout Flow!"), "checkout-flow");
        assert_eq!(slugify("task-state-machine"), "task-state-machine");
        assert_eq!(slugify("checkout.payment"), "checkout-payment");
        assert_eq!(slugify("in_progress"), "in-progress");
    }

    #[test]
    fn test_slugify_trims_and_collapses() {
        assert_eq!(slugify("  --Hello   World--  "), "hello-world");
        assert_eq!(slugify("#shoppingCart.active"), "shoppingcart-active");
        assert_eq!(slugify("a__b..c"), "a-b-c");
    }

    #[test]
    fn test_slugify_empty_and_symbols() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify("Café Menu"), "caf-menu");
    }

    #[test]
    fn test_slugify_idempotent() {
        for input in [
            "Checkout Flow!",
            "  x  ",
            "TaskManagementV2",
            "checkout.payment",
            "Ünïcødé näme",
            "",
        ] {
            let once = slugify(input);
            assert_eq!(slugify(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_find_collisions() {
        let collisions = find_collisions(["In Progress", "done", "in_progress", "Done!"]);
        assert_eq!(
            collisions,
            vec![
                (
                    "in-progress".to_string(),
                    vec!["In Progress".to_string(), "in_progress".to_string()]
                ),
                ("done".to_string(), vec!["done".to_string(), "Done!".to_string()]),
            ]
        );
        assert!(find_collisions(["a", "b", "c"]).is_empty());
    }

    #[test]
    fn test_find_collisions_repeated_name() {
        let collisions = find_collisions(["flow", "other", "flow"]);
        assert_eq!(
            collisions,
            vec![("flow".to_string(), vec!["flow".to_string(), "flow".to_string()])]
        );
    }
}
