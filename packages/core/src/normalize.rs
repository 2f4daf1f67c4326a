// ABOUTME: Tag name normalization and display helpers
// ABOUTME: Default slug function, title-case formatter, and comma-separated tag list parsing

/// Character used to join alphanumeric runs inside a slug
pub const SLUG_SEPARATOR: char = '-';

/// Default normalizer: trims, lower-cases, and collapses every run of
/// non-alphanumeric characters into a single separator.
///
/// The output never starts or ends with a separator, and `slug(slug(x)) == slug(x)`.
pub fn slug(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut pending_separator = false;

    for c in lowered.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push(SLUG_SEPARATOR);
            }
            pending_separator = false;
            out.push(c);
        } else {
            pending_separator = true;
        }
    }

    out
}

/// Default display formatter: upper-cases the first letter of every word and
/// lower-cases the rest. Words are delimited by anything that is not
/// alphanumeric or an apostrophe.
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut at_word_start = true;

    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = c != '\'';
        }
    }

    out
}

/// Whether `value` only uses the slug alphabet: lower-case alphanumerics joined by
/// single separators.
pub fn is_valid_slug(value: &str) -> bool {
    if value.is_empty()
        || value.starts_with(SLUG_SEPARATOR)
        || value.ends_with(SLUG_SEPARATOR)
        || value.contains("--")
    {
        return false;
    }

    value.chars().all(|c| {
        c == SLUG_SEPARATOR || (c.is_alphanumeric() && c.to_lowercase().eq(std::iter::once(c)))
    })
}

/// Expand raw tag input into individual names.
///
/// Every input may itself be a comma-separated list (`"Cooking, Travel"`). Entries are
/// trimmed and empty ones are dropped; duplicates are kept so callers can decide how
/// to compare them.
pub fn parse_tag_list<I, S>(inputs: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    inputs
        .into_iter()
        .flat_map(|input| {
            input
                .as_ref()
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Cooking", "cooking")]
    #[case("  Food Truck  ", "food-truck")]
    #[case("C++ / Rust!!", "c-rust")]
    #[case("--Already-a-slug--", "already-a-slug")]
    #[case("Crème Brûlée", "crème-brûlée")]
    #[case("2024 Elections", "2024-elections")]
    #[case("!!!", "")]
    fn test_slug(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(slug(input), expected);
    }

    #[rstest]
    #[case("Cooking")]
    #[case("  MiXeD   case__and...punctuation ")]
    #[case("İstanbul Straße")]
    #[case("ΣΑΣ.Β")]
    #[case("tabs\tand\nnewlines")]
    fn test_slug_is_idempotent_and_uses_slug_alphabet(#[case] input: &str) {
        let once = slug(input);
        assert_eq!(slug(&once), once);
        assert!(once.is_empty() || is_valid_slug(&once), "bad slug: {:?}", once);
    }

    #[rstest]
    #[case("cooking", "Cooking")]
    #[case("food truck", "Food Truck")]
    #[case("rock-n-roll", "Rock-N-Roll")]
    #[case("o'neil", "O'neil")]
    #[case("SHOUTING", "Shouting")]
    fn test_title_case(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(title_case(input), expected);
    }

    #[test]
    fn test_is_valid_slug_rejects_outside_alphabet() {
        assert!(is_valid_slug("food-truck"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("Food"));
        assert!(!is_valid_slug("food truck"));
        assert!(!is_valid_slug("-food"));
        assert!(!is_valid_slug("food--truck"));
    }

    #[test]
    fn test_parse_tag_list_splits_and_trims() {
        assert_eq!(
            parse_tag_list(["Cooking, Travel"]),
            vec!["Cooking".to_string(), "Travel".to_string()]
        );
        assert_eq!(
            parse_tag_list(vec![" a ".to_string(), ",, b,".to_string(), "   ".to_string()]),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(parse_tag_list(Vec::<&str>::new()).is_empty());
    }
}
