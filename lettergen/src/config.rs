//! Letter configuration from lettergen.toml
//!
//! The file is loaded once and resolved into an immutable
//! [`GenerationSettings`] value that is passed explicitly through the whole
//! generation pass.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "lettergen.toml";

/// Annotated default configuration written by `lettergen init`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("templates/lettergen.toml");

/// Main configuration from lettergen.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LetterConfig {
    /// Sending company
    pub company: CompanyInfo,

    /// Person signing the letters
    pub sender: SenderInfo,

    /// Date, currency and template selection
    pub letter: LetterSettings,

    /// Bodies used when no .docx template is supplied
    pub flat: FlatTemplates,
}

/// Company identity printed in the letter header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyInfo {
    /// Company name
    pub name: String,

    /// Postal address
    pub address: String,

    /// Email or phone
    pub contact: String,
}

/// Person information for the signature block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderInfo {
    /// Sender's full name
    pub name: String,

    /// Sender's job title
    pub title: String,
}

/// Settings shared by both template modes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LetterSettings {
    /// Letter date as YYYY-MM-DD; today when absent
    pub date: Option<String>,

    /// chrono format string used to print the letter date
    pub date_format: String,

    /// Glyph prefixed to currency-formatted amounts
    pub currency_symbol: String,

    /// Path to a .docx template with `{NAME}` placeholders
    pub template: Option<PathBuf>,
}

/// Flat-text templates, one body per account status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlatTemplates {
    /// Header block; defaults to company name, address and contact
    pub header: Option<String>,

    /// Closing block; defaults to a sign-off with the sender details
    pub closing: Option<String>,

    /// Body for active accounts
    pub active_body: String,

    /// Body for inactive accounts
    pub inactive_body: String,
}

impl Default for CompanyInfo {
    fn default() -> Self {
        Self {
            name: "Your Company Name".to_string(),
            address: "Your Address".to_string(),
            contact: "[Email/Phone]".to_string(),
        }
    }
}

impl Default for SenderInfo {
    fn default() -> Self {
        Self {
            name: "Your Name".to_string(),
            title: "Your Title".to_string(),
        }
    }
}

impl Default for LetterSettings {
    fn default() -> Self {
        Self {
            date: None,
            date_format: "%B %d, %Y".to_string(),
            currency_symbol: "₹".to_string(),
            template: None,
        }
    }
}

impl Default for FlatTemplates {
    fn default() -> Self {
        Self {
            header: None,
            closing: None,
            active_body: DEFAULT_ACTIVE_BODY.to_string(),
            inactive_body: DEFAULT_INACTIVE_BODY.to_string(),
        }
    }
}

const DEFAULT_ACTIVE_BODY: &str = "\
We are reaching out regarding your account status and outstanding balance.

Account Details:
• Billing Account: {billing_account}
• Department: {department}
• Outstanding Amount: ₹{outstanding:,.2f}
• Account Status: Active

Please review your account and ensure all payments are up to date. If you have any outstanding balance, we request you to settle it at your earliest convenience.

Payment Options:
• Bank transfer
• Check by mail
• Online payment portal
• Digital payment methods

If you have already made a payment or have any questions about your account, please feel free to contact us.

We value your business and look forward to a continued relationship with you.";

const DEFAULT_INACTIVE_BODY: &str = "\
We are writing to inform you that your account is currently inactive.

Account Details:
• Billing Account: {billing_account}
• Department: {department}
• Outstanding Amount: ₹{outstanding:,.2f}

If your account has been inactive due to closure or completion of services, please disregard this notice. However, if you have any outstanding payments, please settle them at your earliest convenience.

Payment can be made through:
• Bank transfer
• Check by mail
• Online payment portal
• Digital payment methods

If you have any questions regarding your account or need to reactivate your services, please contact us.

Thank you for your attention to this matter.";

/// Fully resolved settings for one generation pass
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    /// Sending company
    pub company: CompanyInfo,
    /// Signing person
    pub sender: SenderInfo,
    /// Letter date, already formatted
    pub letter_date: String,
    /// Glyph prefixed to currency amounts
    pub currency_symbol: String,
    /// Header block of flat-mode letters
    pub header_text: String,
    /// Closing block of flat-mode letters
    pub closing_text: String,
}

impl LetterConfig {
    /// Load configuration from a lettergen.toml file
    ///
    /// # Parameters
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(LetterConfig)` - Successfully loaded configuration
    /// * `Err(ConfigError)` - Error reading or parsing the configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(ConfigError::IoError)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::ParseError)
    }

    /// Save configuration to a lettergen.toml file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::SerializeError)?;

        fs::write(&path, content).map_err(ConfigError::IoError)?;

        Ok(())
    }

    /// Resolve the configuration into the settings of one generation pass
    ///
    /// The letter date is taken from `date_override`, then from the file, and
    /// falls back to `today`.
    pub fn resolve(
        &self,
        date_override: Option<&str>,
        today: NaiveDate,
    ) -> Result<GenerationSettings, ConfigError> {
        let date = match date_override.or(self.letter.date.as_deref()) {
            Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|_| ConfigError::InvalidDate(raw.to_string()))?,
            None => today,
        };
        let letter_date = date.format(&self.letter.date_format).to_string();

        let header_text = self.flat.header.clone().unwrap_or_else(|| {
            format!(
                "{}\n{}\n{}",
                self.company.name, self.company.address, self.company.contact
            )
        });
        let closing_text = self.flat.closing.clone().unwrap_or_else(|| {
            format!(
                "Thank you for your prompt attention.\n\nSincerely,\n\n{}\n{}\n{}",
                self.sender.name, self.sender.title, self.company.name
            )
        });

        Ok(GenerationSettings {
            company: self.company.clone(),
            sender: self.sender.clone(),
            letter_date,
            currency_symbol: self.letter.currency_symbol.clone(),
            header_text,
            closing_text,
        })
    }
}

/// Errors that can occur when loading, saving or resolving configuration
#[derive(Debug)]
#[allow(clippy::enum_variant_names)]
pub enum ConfigError {
    /// IO error when reading or writing file
    IoError(std::io::Error),

    /// Error parsing TOML
    ParseError(toml::de::Error),

    /// Error serializing to TOML
    SerializeError(toml::ser::Error),

    /// Letter date is not YYYY-MM-DD
    InvalidDate(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "TOML parse error: {}", e),
            ConfigError::SerializeError(e) => write!(f, "TOML serialize error: {}", e),
            ConfigError::InvalidDate(raw) => {
                write!(f, "Invalid letter date '{}', expected YYYY-MM-DD", raw)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
