//! Database models and queries

pub mod catalog;
pub mod comments;
pub mod init;
pub mod models;
pub mod reviews;
pub mod settings;
pub mod titles;
pub mod users;

pub use init::*;
pub use models::*;

/// `LIKE` pattern matching `needle` anywhere, with `%`, `_` and the escape
/// character taken literally. Pair with `ESCAPE '\'`.
pub(crate) fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
