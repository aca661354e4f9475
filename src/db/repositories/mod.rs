//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the queries for a specific entity.

pub mod newspaper;
pub mod redactor;
pub mod session;
pub mod topic;

pub use newspaper::{NewspaperFilter, NewspaperRepository, SqlxNewspaperRepository};
pub use redactor::{RedactorFilter, RedactorRepository, SqlxRedactorRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use topic::{SqlxTopicRepository, TopicFilter, TopicRepository};

/// Escape character used by every `LIKE ... ESCAPE` clause
pub(crate) const LIKE_ESCAPE: char = '!';

/// Case folding shared by the `*_folded` search columns and search terms.
///
/// SQLite's `LOWER` only folds ASCII, so folding happens here on write.
pub(crate) fn fold_case(value: &str) -> String {
    value.to_lowercase()
}

/// Build a substring pattern for `<column>_folded LIKE ? ESCAPE '!'`.
///
/// The term is case-folded and its wildcards are escaped so it matches literally.
pub(crate) fn like_pattern(term: &str) -> String {
    let folded = fold_case(term);
    let mut pattern = String::with_capacity(folded.len() + 2);
    pattern.push('%');
    for c in folded.chars() {
        if c == LIKE_ESCAPE || c == '%' || c == '_' {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("polit"), "%polit%");
        assert_eq!(like_pattern("50%_off!"), "%50!%!_off!!%");
    }

    #[test]
    fn test_like_pattern_folds_non_ascii() {
        assert_eq!(like_pattern("ÉCONOMIE"), "%économie%");
        assert_eq!(fold_case("Ünïon Straße"), "ünïon straße");
    }

    proptest! {
        #[test]
        fn like_pattern_wraps_term(term in "[a-zA-Z0-9 ]{0,40}") {
            let pattern = like_pattern(&term);
            prop_assert_eq!(pattern, format!("%{}%", term.to_lowercase()));
        }
    }
}
