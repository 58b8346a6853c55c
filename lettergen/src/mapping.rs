//! Per-record substitution mapping
//!
//! A [`SubstitutionMapping`] maps placeholder tokens (braces included) to
//! replacement text for one letter. It is rebuilt for every record and is
//! lenient: a field the record has no value for maps to an empty string.
//!
//! Entries are kept in insertion order. Raw table columns come first in
//! column order, followed by the derived fields (role aliases, formatted
//! amount, status label, letter date, company and sender). Inserting a token
//! that is already present replaces its value but keeps its original
//! position, so two builds from the same record are always identical.

use crate::config::GenerationSettings;
use crate::records::{FieldRole, FieldValue, Record};
use crate::token::{spelling_variants, PlaceholderToken};
use std::collections::HashMap;

/// Ordered token -> replacement table for one record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionMapping {
    entries: Vec<(PlaceholderToken, String)>,
    index: HashMap<PlaceholderToken, usize>,
}

impl SubstitutionMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a single token
    pub fn insert(&mut self, token: PlaceholderToken, value: impl Into<String>) {
        let value = value.into();
        match self.index.get(&token) {
            Some(&idx) => self.entries[idx].1 = value,
            None => {
                self.index.insert(token.clone(), self.entries.len());
                self.entries.push((token, value));
            }
        }
    }

    /// Insert `value` under every spelling variant of `name`
    ///
    /// Names that cannot form a token (empty, or containing a brace) are
    /// skipped.
    pub fn insert_variants(&mut self, name: &str, value: &str) {
        for variant in spelling_variants(name) {
            match PlaceholderToken::from_name(&variant) {
                Some(token) => self.insert(token, value),
                None => log::debug!("Column name {:?} cannot be used as a placeholder", variant),
            }
        }
    }

    /// Replacement text for an exact token, braces included
    pub fn get(&self, token: &str) -> Option<&str> {
        self.index
            .get(token)
            .map(|&idx| self.entries[idx].1.as_str())
    }

    /// Entries in deterministic iteration order
    pub fn iter(&self) -> impl Iterator<Item = (&PlaceholderToken, &str)> {
        self.entries.iter().map(|(token, value)| (token, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Roles whose value is substituted verbatim under their canonical name
const TEXT_ROLES: [FieldRole; 5] = [
    FieldRole::CustomerName,
    FieldRole::Address,
    FieldRole::BillingAccount,
    FieldRole::Department,
    FieldRole::ClosureDate,
];

/// Build the substitution mapping for one record
///
/// Never fails. Every column of the record's schema is present, whether or
/// not this record has a value for it.
pub fn build_mapping(record: &Record, settings: &GenerationSettings) -> SubstitutionMapping {
    let mut mapping = SubstitutionMapping::new();

    for (column, value) in record.fields() {
        mapping.insert_variants(column, &value.to_string());
    }

    for role in TEXT_ROLES {
        mapping.insert_variants(role.canonical_name(), &record.role(role).to_string());
    }

    // Outstanding amount: grouped with two decimals, optionally prefixed
    let amount = record.role(FieldRole::OutstandingAmount);
    let formatted = format_amount(amount);
    let with_symbol = if formatted.is_empty() {
        String::new()
    } else {
        format!("{}{}", settings.currency_symbol, formatted)
    };
    if let Some(column) = record.schema().column_for(FieldRole::OutstandingAmount) {
        mapping.insert_variants(column, &formatted);
    }
    for name in ["Outstanding Amount", "Outstanding", "Outstanding Amount in Rs"] {
        mapping.insert_variants(name, &formatted);
    }
    for name in ["Outstanding Amount Currency", "Amount Due"] {
        mapping.insert_variants(name, &with_symbol);
    }
    mapping.insert_variants("Outstanding Amount Raw", &amount.to_string());

    let status = record.status_class().label();
    if let Some(column) = record.schema().column_for(FieldRole::Status) {
        mapping.insert_variants(column, status);
    }
    for name in ["Status", "Account Status"] {
        mapping.insert_variants(name, status);
    }
    mapping.insert_variants("Status Raw", &record.role(FieldRole::Status).to_string());

    for name in ["Date", "Letter Date"] {
        mapping.insert_variants(name, &settings.letter_date);
    }

    for name in ["Company Name", "Company"] {
        mapping.insert_variants(name, &settings.company.name);
    }
    mapping.insert_variants("Company Address", &settings.company.address);
    mapping.insert_variants("Company Contact", &settings.company.contact);
    for name in ["Sender Name", "Sender"] {
        mapping.insert_variants(name, &settings.sender.name);
    }
    mapping.insert_variants("Sender Title", &settings.sender.title);

    mapping
}

/// Format an amount with grouped thousands and two decimals
///
/// Empty values format as an empty string. Text that is not a number is
/// passed through unchanged.
pub fn format_amount(value: &FieldValue) -> String {
    match value.as_number() {
        Some(n) => group_thousands(&format!("{:.2}", n)),
        None => value.to_string(),
    }
}

/// Insert `,` between every three integer digits of a formatted number
///
/// `"-1234567.891"` becomes `"-1,234,567.891"`. Input that does not start
/// with digits (after an optional sign) is returned unchanged.
pub fn group_thousands(number: &str) -> String {
    let (sign, unsigned) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let split = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    let (digits, rest) = unsigned.split_at(split);
    if digits.is_empty() {
        return number.to_string();
    }

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{}{}{}", sign, grouped, rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LetterConfig;
    use crate::records::RecordSet;
    use chrono::NaiveDate;

    fn settings() -> GenerationSettings {
        let mut config = LetterConfig::default();
        config.company.name = "ABC Telecom".to_string();
        config.sender.name = "Priya Sharma".to_string();
        config
            .resolve(Some("2026-02-09"), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
            .unwrap()
    }

    fn records() -> RecordSet {
        RecordSet::from_csv_reader(
            "\
Billing Account,CUSTOMER NAME,Address,Status(Active/Inactive),Outstanding amount in Rs
ACC-12345,John Smith,123 Main St,Active,5000.5
ACC-67890,Jane Doe,,Inactive ,n/a
"
            .as_bytes(),
        )
        .unwrap()
    }

    #[test]
    fn test_raw_columns_with_spelling_variants() {
        let set = records();
        let mapping = build_mapping(&set.records()[0], &settings());

        for token in [
            "{Billing Account}",
            "{BILLING_ACCOUNT}",
            "{billing_account}",
            "{billingaccount}",
        ] {
            assert_eq!(mapping.get(token), Some("ACC-12345"), "{}", token);
        }
        assert_eq!(mapping.get("{CUSTOMER NAME}"), Some("John Smith"));
        assert_eq!(mapping.get("{customer_name}"), Some("John Smith"));
        assert_eq!(mapping.get("{Customer Name}"), Some("John Smith"));
        // Not a declared variant
        assert_eq!(mapping.get("{Billing-Account}"), None);
    }

    #[test]
    fn test_missing_values_are_empty_strings() {
        let set = records();
        let mapping = build_mapping(&set.records()[1], &settings());
        assert_eq!(mapping.get("{Address}"), Some(""));
        assert_eq!(mapping.get("{DEPARTMENT}"), Some(""));
        assert_eq!(mapping.get("{Closure Date}"), Some(""));
    }

    #[test]
    fn test_derived_fields() {
        let set = records();
        let john = build_mapping(&set.records()[0], &settings());
        assert_eq!(john.get("{Outstanding amount in Rs}"), Some("5,000.50"));
        assert_eq!(john.get("{OUTSTANDING_AMOUNT}"), Some("5,000.50"));
        assert_eq!(john.get("{Amount Due}"), Some("₹5,000.50"));
        assert_eq!(john.get("{Outstanding Amount Raw}"), Some("5000.5"));
        assert_eq!(john.get("{Status}"), Some("Active"));
        assert_eq!(john.get("{DATE}"), Some("February 09, 2026"));
        assert_eq!(john.get("{letter_date}"), Some("February 09, 2026"));
        assert_eq!(john.get("{Company Name}"), Some("ABC Telecom"));
        assert_eq!(john.get("{SENDER_NAME}"), Some("Priya Sharma"));
        assert_eq!(john.get("{Sender Title}"), Some("Your Title"));

        let jane = build_mapping(&set.records()[1], &settings());
        assert_eq!(jane.get("{Status(Active/Inactive)}"), Some("Inactive"));
        assert_eq!(jane.get("{Status Raw}"), Some("Inactive "));
        // Non-numeric amounts pass through unformatted
        assert_eq!(jane.get("{Outstanding amount in Rs}"), Some("n/a"));
    }

    #[test]
    fn test_every_raw_value_is_reachable() {
        let set = records();
        for record in set.records() {
            let mapping = build_mapping(record, &settings());
            for (column, value) in record.fields() {
                let raw = value.to_string();
                assert!(
                    mapping.iter().any(|(_, v)| v == raw),
                    "no entry for raw value of {}",
                    column
                );
            }
        }
    }

    #[test]
    fn test_build_is_deterministic() {
        let set = records();
        let first = build_mapping(&set.records()[0], &settings());
        let second = build_mapping(&set.records()[0], &settings());
        assert_eq!(first, second);
        assert!(first.iter().map(|(t, _)| t).eq(second.iter().map(|(t, _)| t)));
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let mut mapping = SubstitutionMapping::new();
        mapping.insert(PlaceholderToken::from_name("A").unwrap(), "1");
        mapping.insert(PlaceholderToken::from_name("B").unwrap(), "2");
        mapping.insert(PlaceholderToken::from_name("A").unwrap(), "3");

        let entries: Vec<_> = mapping.iter().map(|(t, v)| (t.as_str(), v)).collect();
        assert_eq!(entries, [("{A}", "3"), ("{B}", "2")]);
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("0.00"), "0.00");
        assert_eq!(group_thousands("999.99"), "999.99");
        assert_eq!(group_thousands("1000"), "1,000");
        assert_eq!(group_thousands("-1234567.891"), "-1,234,567.891");
        assert_eq!(group_thousands("n/a"), "n/a");
        assert_eq!(format_amount(&FieldValue::Number(2500.75)), "2,500.75");
        assert_eq!(format_amount(&FieldValue::Empty), "");
    }
}
