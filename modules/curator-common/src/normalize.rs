/// Normalized form of a category name: lowercased, trimmed, internal
/// whitespace runs collapsed to single spaces. Categories are unique on this
/// key, so "Fitness  &  Health" and "fitness & health" resolve to the same row.
pub fn normalize_category_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_collapses_whitespace() {
        assert_eq!(
            normalize_category_name("  Fitness   &  Health "),
            "fitness & health"
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            "Fitness & Health",
            "  ALREADY   messy\tinput ",
            "plain",
            "",
            "\u{00a0}unicode\u{2003}spaces",
        ];
        for input in inputs {
            let once = normalize_category_name(input);
            assert_eq!(normalize_category_name(&once), once);
        }
    }

    #[test]
    fn empty_and_blank_normalize_to_empty() {
        assert_eq!(normalize_category_name(""), "");
        assert_eq!(normalize_category_name("   \t "), "");
    }
}
