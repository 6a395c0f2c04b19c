//! Database repository implementations

pub mod activity_repository;
pub mod channel_group_repository;
pub mod channel_repository;
pub mod message_repository;
pub mod subscriber_repository;
pub mod subscription_repository;
pub mod user_repository;

// Re-export all repositories for convenience
pub use activity_repository::*;
pub use channel_group_repository::*;
pub use channel_repository::*;
pub use message_repository::*;
pub use subscriber_repository::*;
pub use subscription_repository::*;
pub use user_repository::*;

/// Turn free text into a `LIKE ... ESCAPE '\'` pattern matching it anywhere.
///
/// Blank input yields `None` so callers can skip the filter entirely.
pub(crate) fn like_pattern(search: Option<&str>) -> Option<String> {
    let search = search.map(str::trim).filter(|s| !s.is_empty())?;
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for ch in search.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    Some(pattern)
}
