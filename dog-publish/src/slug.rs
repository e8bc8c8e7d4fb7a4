use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Used when a title has nothing slug-worthy left (emoji, CJK, punctuation).
pub const FALLBACK_SLUG: &str = "post";

/// URL-safe slug: lowercase ASCII letters and digits separated by single hyphens.
///
/// Diacritics are stripped (`Crème Brûlée` -> `creme-brulee`); anything else
/// outside `[a-z0-9]` becomes a separator.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.nfkd().filter(|c| !is_combining_mark(*c)) {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// The slug tried on a given attempt: `base`, then `base-2`, `base-3`, ...
pub fn candidate(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        base.to_string()
    } else {
        format!("{base}-{attempt}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  Rust: 2024 -- edition!  "), "rust-2024-edition");
    }

    #[test]
    fn strips_diacritics() {
        assert_eq!(slugify("Crème Brûlée à la carte"), "creme-brulee-a-la-carte");
        assert_eq!(slugify("Ångström"), "angstrom");
    }

    #[test]
    fn falls_back_when_nothing_survives() {
        assert_eq!(slugify("!!!"), FALLBACK_SLUG);
        assert_eq!(slugify("日本語"), FALLBACK_SLUG);
    }

    #[test]
    fn candidates_count_from_two() {
        assert_eq!(candidate("hello-world", 1), "hello-world");
        assert_eq!(candidate("hello-world", 2), "hello-world-2");
        assert_eq!(candidate("hello-world", 10), "hello-world-10");
    }

    #[test]
    fn slugify_is_idempotent() {
        for title in ["Hello World", "Crème Brûlée", "a--b", "post-2"] {
            let once = slugify(title);
            assert_eq!(slugify(&once), once);
        }
    }
}
