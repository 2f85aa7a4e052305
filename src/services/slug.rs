//! Slug generation

/// Generate a URL-friendly slug from a title.
///
/// Lowercases, maps separators and ASCII punctuation to hyphens, keeps
/// non-ASCII characters as-is, and collapses consecutive hyphens.
pub fn generate_slug(title: &str) -> String {
    let slug: String = title
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c
            } else if c == ' ' || c == '_' || c == '-' {
                '-'
            } else if !c.is_ascii() {
                // Keep non-ASCII characters (e.g. CJK titles)
                c
            } else {
                '-'
            }
        })
        .collect();

    // Collapse consecutive hyphens and trim hyphens from both ends
    let mut result = String::new();
    let mut prev_hyphen = false;

    for c in slug.chars() {
        if c == '-' {
            if !prev_hyphen && !result.is_empty() {
                result.push(c);
                prev_hyphen = true;
            }
        } else {
            result.push(c);
            prev_hyphen = false;
        }
    }

    result.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_title() {
        assert_eq!(generate_slug("Hello World"), "hello-world");
    }

    #[test]
    fn test_punctuation_collapsed() {
        assert_eq!(generate_slug("Rust: Async, Done Right!"), "rust-async-done-right");
    }

    #[test]
    fn test_leading_trailing_separators_trimmed() {
        assert_eq!(generate_slug("  --Trimmed--  "), "trimmed");
    }

    #[test]
    fn test_non_ascii_preserved() {
        assert_eq!(generate_slug("项目 One"), "项目-one");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(generate_slug(""), "");
        assert_eq!(generate_slug("!!!"), "");
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        /// Slugs never contain spaces, uppercase ASCII, or doubled hyphens.
        #[test]
        fn slug_is_normalized(title in ".{0,80}") {
            let slug = generate_slug(&title);
            prop_assert!(!slug.contains(' '));
            prop_assert!(!slug.contains("--"));
            prop_assert!(!slug.chars().any(|c| c.is_ascii_uppercase()));
            prop_assert!(!slug.starts_with('-'));
            prop_assert!(!slug.ends_with('-'));
        }

        /// Slug generation is idempotent.
        #[test]
        fn slug_is_idempotent(title in "[a-zA-Z0-9 _-]{0,60}") {
            let once = generate_slug(&title);
            prop_assert_eq!(generate_slug(&once), once);
        }
    }
}
