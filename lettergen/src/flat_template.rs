//! Flat-text letter bodies
//!
//! Without a .docx template, each letter body comes from one of two
//! free-text templates picked by the record's account status. Bodies use
//! `{name}` and `{name:spec}` fields over a small fixed vocabulary (see
//! [`FormatArgs::from_record`]). Unlike `.docx` placeholders, formatting is
//! strict: an unknown field name or a spec that does not fit the value is an
//! error, not an empty string.
//!
//! Supported specs are `[,][.N][f|d|s]`: `,` groups thousands, `.N` sets
//! the precision (digits after the point for numbers, maximum length for
//! text). `d` applies to integers only: a float is a type mismatch even
//! when it has no fractional part. `{{` and `}}` produce literal braces.

use crate::config::{FlatTemplates, GenerationSettings};
use crate::mapping::group_thousands;
use crate::records::{FieldRole, FieldValue, Record, StatusClass};
use std::collections::HashMap;
use thiserror::Error;

/// Errors formatting a flat-text body
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormattingError {
    #[error("Unknown field '{{{0}}}' in letter template")]
    UnknownField(String),

    #[error("Invalid format spec '{spec}' for field '{field}'")]
    InvalidFormatSpec { field: String, spec: String },

    #[error("Format spec '{spec}' does not apply to the value of '{field}'")]
    TypeMismatch { field: String, spec: String },

    #[error("Unmatched brace at byte {0} of letter template")]
    Unbalanced(usize),
}

/// The active and inactive bodies of flat-text mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatTemplate {
    pub active: String,
    pub inactive: String,
}

impl FlatTemplate {
    pub fn new(active: impl Into<String>, inactive: impl Into<String>) -> Self {
        Self {
            active: active.into(),
            inactive: inactive.into(),
        }
    }

    /// Body for `status`
    pub fn select(&self, status: StatusClass) -> &str {
        select_body(status, &self.active, &self.inactive)
    }

    /// Select and format the body for one record
    pub fn render(
        &self,
        record: &Record,
        settings: &GenerationSettings,
    ) -> Result<String, FormattingError> {
        let body = self.select(record.status_class());
        format_template(body, &FormatArgs::from_record(record, settings))
    }
}

impl From<&FlatTemplates> for FlatTemplate {
    fn from(config: &FlatTemplates) -> Self {
        Self::new(config.active_body.clone(), config.inactive_body.clone())
    }
}

/// Pick the body matching a status class
pub fn select_body<'a>(status: StatusClass, active: &'a str, inactive: &'a str) -> &'a str {
    match status {
        StatusClass::Active => active,
        StatusClass::Inactive => inactive,
    }
}

/// Named values available to a flat-text body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormatArgs {
    values: HashMap<String, FieldValue>,
}

impl FormatArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// The flat-text vocabulary for one record
    ///
    /// `outstanding` is a number when the amount parses as one and 0 when
    /// the cell is empty. Any other amount stays text, so a numeric spec on it
    /// is a [`FormattingError::TypeMismatch`]. Every other field is text.
    pub fn from_record(record: &Record, settings: &GenerationSettings) -> Self {
        let mut args = Self::new();
        let text = |role| FieldValue::Text(record.role_text_or(role, ""));

        let amount = record.role(FieldRole::OutstandingAmount);
        let outstanding = match (amount, amount.as_number()) {
            (FieldValue::Empty, _) => FieldValue::Number(0.0),
            (_, Some(n)) => FieldValue::Number(n),
            (_, None) => FieldValue::Text(amount.to_string()),
        };

        args.insert("billing_account", text(FieldRole::BillingAccount));
        args.insert("department", text(FieldRole::Department));
        args.insert("outstanding", outstanding);
        args.insert("customer_name", FieldValue::Text(record.display_name()));
        args.insert("address", text(FieldRole::Address));
        args.insert("status", FieldValue::Text(record.status_class().label().to_string()));
        args.insert("closure_date", text(FieldRole::ClosureDate));
        args.insert("letter_date", FieldValue::Text(settings.letter_date.clone()));
        args.insert("company_name", FieldValue::Text(settings.company.name.clone()));
        args.insert("sender_name", FieldValue::Text(settings.sender.name.clone()));
        args
    }
}

/// Replace every `{name[:spec]}` field of `template`
pub fn format_template(template: &str, args: &FormatArgs) -> Result<String, FormattingError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' => {
                if chars.next_if(|&(_, next)| next == '{').is_some() {
                    out.push('{');
                    continue;
                }
                let mut field = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, '{')) | None => return Err(FormattingError::Unbalanced(pos)),
                        Some((_, inner)) => field.push(inner),
                    }
                }
                out.push_str(&format_field(&field, args)?);
            }
            '}' => {
                if chars.next_if(|&(_, next)| next == '}').is_none() {
                    return Err(FormattingError::Unbalanced(pos));
                }
                out.push('}');
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FormatSpec {
    grouping: bool,
    precision: Option<usize>,
    kind: Option<char>,
}

impl FormatSpec {
    fn parse(spec: &str) -> Option<Self> {
        let mut rest = spec;
        let grouping = match rest.strip_prefix(',') {
            Some(r) => {
                rest = r;
                true
            }
            None => false,
        };

        let mut precision = None;
        if let Some(r) = rest.strip_prefix('.') {
            let digits = r.find(|c: char| !c.is_ascii_digit()).unwrap_or(r.len());
            if digits == 0 {
                return None;
            }
            precision = Some(r[..digits].parse().ok()?);
            rest = &r[digits..];
        }

        let kind = match rest {
            "" => None,
            "f" | "d" | "s" => rest.chars().next(),
            _ => return None,
        };

        Some(Self {
            grouping,
            precision,
            kind,
        })
    }
}

fn format_field(field: &str, args: &FormatArgs) -> Result<String, FormattingError> {
    let (name, spec) = field.split_once(':').unwrap_or((field, ""));
    let value = args
        .get(name)
        .ok_or_else(|| FormattingError::UnknownField(name.to_string()))?;

    let invalid = || FormattingError::InvalidFormatSpec {
        field: name.to_string(),
        spec: spec.to_string(),
    };
    let mismatch = || FormattingError::TypeMismatch {
        field: name.to_string(),
        spec: spec.to_string(),
    };
    let parsed = FormatSpec::parse(spec).ok_or_else(invalid)?;

    let digits = match value {
        FieldValue::Number(n) => match (parsed.kind, parsed.precision) {
            // `d` only applies to integers, even for whole floats
            (Some('s' | 'd'), _) => return Err(mismatch()),
            (Some('f'), precision) => format!("{:.*}", precision.unwrap_or(6), n),
            (_, Some(precision)) => format!("{:.*}", precision, n),
            (_, None) => value.to_string(),
        },
        FieldValue::Integer(i) => match (parsed.kind, parsed.precision) {
            (Some('s'), _) => return Err(mismatch()),
            (Some('f'), precision) => format!("{:.*}", precision.unwrap_or(6), *i as f64),
            (_, Some(_)) => return Err(invalid()),
            (_, None) => i.to_string(),
        },
        FieldValue::Text(_) | FieldValue::Empty => {
            if matches!(parsed.kind, Some('f' | 'd')) {
                return Err(mismatch());
            }
            if parsed.grouping {
                return Err(invalid());
            }
            let text = value.to_string();
            return Ok(match parsed.precision {
                Some(max) => text.chars().take(max).collect(),
                None => text,
            });
        }
    };

    Ok(if parsed.grouping {
        group_thousands(&digits)
    } else {
        digits
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LetterConfig;
    use crate::records::RecordSet;
    use chrono::NaiveDate;

    fn settings() -> GenerationSettings {
        LetterConfig::default()
            .resolve(Some("2026-02-09"), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
            .unwrap()
    }

    fn args() -> FormatArgs {
        let mut args = FormatArgs::new();
        args.insert("billing_account", "ACC-12345");
        args.insert("outstanding", 5000.5);
        args.insert("count", 1234567.0);
        args.insert("accounts", 1234567i64);
        args
    }

    #[test]
    fn test_format_specs() {
        let args = args();
        let cases = [
            ("{billing_account}", "ACC-12345"),
            ("{outstanding:,.2f}", "5,000.50"),
            ("{outstanding:.1f}", "5000.5"),
            ("{outstanding:f}", "5000.500000"),
            ("{outstanding}", "5000.5"),
            ("{count:,.0f}", "1,234,567"),
            ("{count}", "1234567.0"),
            ("{accounts:,d}", "1,234,567"),
            ("{accounts:.1f}", "1234567.0"),
            ("{accounts}", "1234567"),
            ("{billing_account:.3}", "ACC"),
            ("{billing_account:s}", "ACC-12345"),
            ("{{literal}} {billing_account}", "{literal} ACC-12345"),
        ];
        for (template, expected) in cases {
            assert_eq!(format_template(template, &args).unwrap(), expected, "{}", template);
        }
    }

    #[test]
    fn test_strict_errors() {
        let args = args();
        assert_eq!(
            format_template("Dear {customer}", &args),
            Err(FormattingError::UnknownField("customer".to_string()))
        );
        assert!(matches!(
            format_template("{outstanding:>10}", &args),
            Err(FormattingError::InvalidFormatSpec { .. })
        ));
        assert!(matches!(
            format_template("{billing_account:,.2f}", &args),
            Err(FormattingError::TypeMismatch { .. })
        ));
        assert!(matches!(
            format_template("{outstanding:d}", &args),
            Err(FormattingError::TypeMismatch { .. })
        ));
        assert!(matches!(
            format_template("{accounts:.2}", &args),
            Err(FormattingError::InvalidFormatSpec { .. })
        ));
        // Whole floats are still floats
        assert!(matches!(
            format_template("{count:,d}", &args),
            Err(FormattingError::TypeMismatch { .. })
        ));
        assert_eq!(
            format_template("Total: {outstanding", &args),
            Err(FormattingError::Unbalanced(7))
        );
        assert_eq!(
            format_template("a } b", &args),
            Err(FormattingError::Unbalanced(2))
        );
    }

    #[test]
    fn test_selects_body_by_status() {
        let set = RecordSet::from_csv_reader(
            "\
CUSTOMER NAME,Billing Account,Department,Status(Active/Inactive),Outstanding amount in Rs
John Smith,ACC-1,Sales,Active,5000.5
Jane Doe,ACC-2,,Inactive ,
"
            .as_bytes(),
        )
        .unwrap();
        let template = FlatTemplate::new(
            "Active {billing_account}: {outstanding:,.2f}",
            "Inactive {billing_account} ({department}): {outstanding:,.2f}",
        );

        assert_eq!(
            template.render(&set.records()[0], &settings()).unwrap(),
            "Active ACC-1: 5,000.50"
        );
        assert_eq!(
            template.render(&set.records()[1], &settings()).unwrap(),
            "Inactive ACC-2 (): 0.00"
        );
    }

    #[test]
    fn test_unparseable_amount_is_not_zero() {
        let set = RecordSet::from_csv_reader(
            "\
Billing Account,Outstanding amount in Rs
ACC-1,pending review
"
            .as_bytes(),
        )
        .unwrap();
        let record = &set.records()[0];
        let args = FormatArgs::from_record(record, &settings());
        assert_eq!(
            args.get("outstanding"),
            Some(&FieldValue::Text("pending review".to_string()))
        );

        let template = FlatTemplate::new("Due: {outstanding:,.2f}", "Due: {outstanding:,.2f}");
        assert_eq!(
            template.render(record, &settings()),
            Err(FormattingError::TypeMismatch {
                field: "outstanding".to_string(),
                spec: ",.2f".to_string(),
            })
        );
        // Without a numeric spec the text is shown as written
        let plain = FlatTemplate::new("Due: {outstanding}", "Due: {outstanding}");
        assert_eq!(plain.render(record, &settings()).unwrap(), "Due: pending review");
    }

    #[test]
    fn test_default_bodies_format() {
        let set = RecordSet::from_csv_reader(
            "Billing Account,Department,Outstanding amount in Rs\nACC-1,Sales,1234.5\n".as_bytes(),
        )
        .unwrap();
        let template = FlatTemplate::from(&LetterConfig::default().flat);
        let body = template.render(&set.records()[0], &settings()).unwrap();
        assert!(body.contains("• Billing Account: ACC-1"));
        assert!(body.contains("• Outstanding Amount: ₹1,234.50"));
        assert!(body.contains("• Account Status: Active"));
    }
}
