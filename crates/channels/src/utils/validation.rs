//! Validation utilities.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

static KEYWORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid regex"));
static TPARTY_KEYWORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?\d{5,15}$").expect("valid regex"));
static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid regex")
});
static LIST_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,;\s]+").expect("valid regex"));

/// Field errors collected while building a record, in the order found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    entries: Vec<(String, String)>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.entries.push((field.into(), message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Messages recorded against `field`.
    pub fn on(&self, field: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(f, _)| f == field)
            .map(|(_, m)| m.as_str())
            .collect()
    }

    /// Human-readable messages such as `Name can't be blank`.
    pub fn full_messages(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(field, message)| format!("{} {}", humanize(field), message))
            .collect()
    }

    /// All messages as one sentence, the way the form banner shows them.
    pub fn to_sentence(&self) -> String {
        self.full_messages().join(", and ")
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sentence())
    }
}

/// Serializes as `{"field": ["message", ...]}` keeping first-seen field order.
impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut fields: Vec<&str> = Vec::new();
        for (field, _) in &self.entries {
            if !fields.contains(&field.as_str()) {
                fields.push(field);
            }
        }

        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for field in fields {
            map.serialize_entry(field, &self.on(field))?;
        }
        map.end()
    }
}

fn humanize(field: &str) -> String {
    let spaced = field.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Validation utilities
pub struct Validator;

impl Validator {
    /// A single word of letters, digits, `_` or `-`.
    pub fn keyword(keyword: &str) -> bool {
        KEYWORD.is_match(keyword)
    }

    /// A phone number or short code: optional `+`, then 5 to 15 digits.
    pub fn tparty_keyword(tparty_keyword: &str) -> bool {
        TPARTY_KEYWORD.is_match(tparty_keyword)
    }

    pub fn email(email: &str) -> bool {
        email.len() <= 255 && EMAIL.is_match(email)
    }

    /// Split a comma, semicolon or whitespace separated list, dropping blanks.
    pub fn split_list(list: &str) -> Vec<&str> {
        LIST_SEPARATOR
            .split(list)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect()
    }

    /// Parse a form boolean: `1/0/true/false/on/off/yes/no`, case-insensitive.
    pub fn boolean(value: &str) -> Option<bool> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "on" | "yes" => Some(true),
            "0" | "false" | "off" | "no" => Some(false),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_messages_are_humanized_and_joined() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "can't be blank");
        errors.add("tparty_keyword", "must be a phone number or short code");

        assert_eq!(
            errors.to_sentence(),
            "Name can't be blank, and Tparty keyword must be a phone number or short code"
        );
    }

    #[test]
    fn test_serializes_grouped_by_field() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "can't be blank");
        errors.add("keyword", "must be a single word");
        errors.add("name", "is too short");

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["name"], serde_json::json!(["can't be blank", "is too short"]));
        assert_eq!(json["keyword"], serde_json::json!(["must be a single word"]));
    }

    #[test]
    fn test_into_result() {
        assert!(ValidationErrors::new().into_result().is_ok());
        let mut errors = ValidationErrors::new();
        errors.add("type", "can't be blank");
        assert_eq!(errors.clone().into_result(), Err(errors));
    }

    #[test]
    fn test_validator_rules() {
        assert!(Validator::keyword("join-now_2"));
        assert!(!Validator::keyword("two words"));
        assert!(Validator::tparty_keyword("+14084084080"));
        assert!(Validator::tparty_keyword("12345"));
        assert!(!Validator::tparty_keyword("1234"));
        assert!(!Validator::tparty_keyword("phone"));
        assert!(Validator::email("mod@example.com"));
        assert!(!Validator::email("not-an-email"));
        assert_eq!(
            Validator::split_list("a@x.io, b@x.io;c@x.io  d@x.io"),
            vec!["a@x.io", "b@x.io", "c@x.io", "d@x.io"]
        );
        assert_eq!(Validator::boolean("On"), Some(true));
        assert_eq!(Validator::boolean("no"), Some(false));
        assert_eq!(Validator::boolean("maybe"), None);
    }
}
