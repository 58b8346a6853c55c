//! Placeholder token grammar
//!
//! A placeholder is `{` followed by one or more characters other than `}`,
//! then `}`. So `{Billing Account}`, `{BILLING_ACCOUNT}` and
//! `{Status(Active/Inactive)}` are all tokens. An opening brace inside a
//! token is part of its name: `{{x}` is one token. Matching is exact: case,
//! spacing and punctuation are significant.

use itertools::Itertools;
use regex::Regex;
use std::borrow::Borrow;
use std::fmt;
use std::sync::OnceLock;

/// A placeholder token in its exact surface form, braces included
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaceholderToken(String);

impl PlaceholderToken {
    /// Wrap a field name in braces
    ///
    /// Returns `None` when the name is empty or contains a brace.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.is_empty() || name.contains(['{', '}']) {
            return None;
        }
        Some(Self(format!("{{{}}}", name)))
    }

    /// The token text, braces included
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name between the braces
    pub fn name(&self) -> &str {
        &self.0[1..self.0.len() - 1]
    }
}

impl fmt::Display for PlaceholderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PlaceholderToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PlaceholderToken {
    fn borrow(&self) -> &str {
        &self.0
    }
}

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r"\{[^}]+\}").expect("placeholder pattern is valid"))
}

/// Every placeholder occurrence in `text`, left to right
pub fn find_tokens(text: &str) -> impl Iterator<Item = PlaceholderToken> + '_ {
    token_regex()
        .find_iter(text)
        .map(|m| PlaceholderToken(m.as_str().to_string()))
}

/// Spelling variants of a field name accepted as placeholders
///
/// For `Billing Account` this yields the name as written, with spaces turned
/// into underscores and with spaces removed, each also in upper and lower
/// case. Duplicates are dropped, first occurrence wins.
pub fn spelling_variants(name: &str) -> Vec<String> {
    let as_is = name.to_string();
    let underscored = name.replace(' ', "_");
    let compact = name.replace(' ', "");

    [as_is, underscored, compact]
        .into_iter()
        .flat_map(|form| {
            let upper = form.to_uppercase();
            let lower = form.to_lowercase();
            [form, upper, lower]
        })
        .filter(|variant| !variant.is_empty())
        .unique()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_tokens_keeps_surface_form() {
        let found: Vec<_> = find_tokens("Dear {CUSTOMER NAME}, {Outstanding amount in Rs} due {DATE}")
            .map(|t| t.to_string())
            .collect();
        assert_eq!(
            found,
            ["{CUSTOMER NAME}", "{Outstanding amount in Rs}", "{DATE}"]
        );
    }

    #[test]
    fn test_find_tokens_opening_brace_belongs_to_name() {
        let found: Vec<_> = find_tokens("{} {{x}} {a{b}")
            .map(|t| t.to_string())
            .collect();
        assert_eq!(found, ["{{x}", "{a{b}"]);
    }

    #[test]
    fn test_from_name() {
        let token = PlaceholderToken::from_name("Status(Active/Inactive)").unwrap();
        assert_eq!(token.as_str(), "{Status(Active/Inactive)}");
        assert_eq!(token.name(), "Status(Active/Inactive)");
        assert!(PlaceholderToken::from_name("").is_none());
        assert!(PlaceholderToken::from_name("a}b").is_none());
    }

    #[test]
    fn test_spelling_variants() {
        assert_eq!(
            spelling_variants("Billing Account"),
            [
                "Billing Account",
                "BILLING ACCOUNT",
                "billing account",
                "Billing_Account",
                "BILLING_ACCOUNT",
                "billing_account",
                "BillingAccount",
                "BILLINGACCOUNT",
                "billingaccount",
            ]
        );
        assert_eq!(spelling_variants("SSA"), ["SSA", "ssa"]);
    }
}
