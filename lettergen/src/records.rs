//! Customer records read from tabular input
//!
//! The header row of the table is the authoritative field vocabulary: every
//! record exposes exactly the columns the table declares, in column order,
//! whether or not a given row has a value for them.

use calamine::{Data, Reader};
use chrono::NaiveTime;
use std::fmt;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// A scalar cell value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Missing or blank cell
    Empty,
    /// Text as it appeared in the table
    Text(String),
    /// Whole-number spreadsheet cell
    Integer(i64),
    /// Numeric cell
    Number(f64),
}

static EMPTY: FieldValue = FieldValue::Empty;

impl FieldValue {
    /// Build a value from a raw table cell; blank cells become [`FieldValue::Empty`]
    pub fn from_cell(cell: &str) -> Self {
        if cell.trim().is_empty() {
            FieldValue::Empty
        } else {
            FieldValue::Text(cell.to_string())
        }
    }

    /// Whether the cell is missing or blank
    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Empty)
    }

    /// Numeric interpretation of the value
    ///
    /// Text is accepted when it parses as a number once thousands separators,
    /// currency glyphs and surrounding spaces are removed.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Text(s) => {
                let cleaned: String = s
                    .trim()
                    .trim_start_matches("Rs.")
                    .trim_start_matches("Rs")
                    .chars()
                    .filter(|c| !matches!(c, ',' | '₹' | '$' | '€' | '£') && !c.is_whitespace())
                    .collect();
                cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
            }
            FieldValue::Empty => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Empty => Ok(()),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{:.1}", n),
            FieldValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::from_cell(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<&Data> for FieldValue {
    /// Spreadsheet cells keep their type: whole numbers become
    /// [`FieldValue::Integer`], other numbers [`FieldValue::Number`] and dates
    /// are rendered as text
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty => FieldValue::Empty,
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => FieldValue::from_cell(s),
            Data::Int(i) => FieldValue::Integer(*i),
            Data::Float(n) if n.fract() == 0.0 && n.abs() < MAX_EXACT_INTEGER => {
                FieldValue::Integer(*n as i64)
            }
            Data::Float(n) => FieldValue::Number(*n),
            Data::Bool(b) => FieldValue::Text(if *b { "True" } else { "False" }.to_string()),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(dt) if dt.time() == NaiveTime::MIN => {
                    FieldValue::Text(dt.format("%Y-%m-%d").to_string())
                }
                Some(dt) => FieldValue::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
                None => FieldValue::Number(dt.as_f64()),
            },
            Data::Error(e) => {
                log::debug!("Spreadsheet cell error {:?} read as empty", e);
                FieldValue::Empty
            }
        }
    }
}

/// Largest float magnitude that still holds every integer exactly
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Well-known columns the letter layout and aliases rely on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRole {
    CustomerName,
    Address,
    BillingAccount,
    Department,
    OutstandingAmount,
    Status,
    ClosureDate,
}

impl FieldRole {
    /// All roles in display order
    pub const ALL: [FieldRole; 7] = [
        FieldRole::CustomerName,
        FieldRole::Address,
        FieldRole::BillingAccount,
        FieldRole::Department,
        FieldRole::OutstandingAmount,
        FieldRole::Status,
        FieldRole::ClosureDate,
    ];

    /// Canonical display name, also used as the base of alias placeholders
    pub fn canonical_name(self) -> &'static str {
        match self {
            FieldRole::CustomerName => "Customer Name",
            FieldRole::Address => "Address",
            FieldRole::BillingAccount => "Billing Account",
            FieldRole::Department => "Department",
            FieldRole::OutstandingAmount => "Outstanding Amount",
            FieldRole::Status => "Status",
            FieldRole::ClosureDate => "Closure Date",
        }
    }

    /// Normalized header names recognised for this role, best match first
    fn header_candidates(self) -> &'static [&'static str] {
        match self {
            FieldRole::CustomerName => &["customername", "customer", "name"],
            FieldRole::Address => &["address", "customeraddress"],
            FieldRole::BillingAccount => &["billingaccount", "accountnumber", "account"],
            FieldRole::Department => &["department", "dept"],
            FieldRole::OutstandingAmount => &[
                "outstandingamountinrs",
                "outstandingamount",
                "outstanding",
                "amount",
            ],
            FieldRole::Status => &["statusactiveinactive", "status", "accountstatus"],
            FieldRole::ClosureDate => &["closuredate"],
        }
    }
}

/// Lower-case a header and drop everything but letters and digits
fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// The ordered column names of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    /// Create a schema from header names in column order
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    /// Column names in source order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Position of a column by exact name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// The column playing `role`, matched on normalized header names
    pub fn column_for(&self, role: FieldRole) -> Option<&str> {
        let normalized: Vec<String> = self.columns.iter().map(|c| normalize_header(c)).collect();
        role.header_candidates().iter().find_map(|candidate| {
            normalized
                .iter()
                .position(|n| n == candidate)
                .map(|idx| self.columns[idx].as_str())
        })
    }
}

/// Derived account classification of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Active,
    Inactive,
}

impl StatusClass {
    /// Classification of a record, see [`Record::status_class`]
    pub fn of(record: &Record) -> Self {
        record.status_class()
    }

    /// Classify a raw status value; anything not mentioning "inactive" is active
    pub fn classify(raw: &str) -> Self {
        if raw.to_lowercase().contains("inactive") {
            StatusClass::Inactive
        } else {
            StatusClass::Active
        }
    }

    /// Capitalized label, e.g. `Active`
    pub fn label(self) -> &'static str {
        match self {
            StatusClass::Active => "Active",
            StatusClass::Inactive => "Inactive",
        }
    }
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the table
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    position: usize,
    schema: Arc<Schema>,
    values: Vec<FieldValue>,
}

impl Record {
    /// 0-based position of the row in the source table
    pub fn position(&self) -> usize {
        self.position
    }

    /// 1-based row number as an operator would count it
    pub fn row_number(&self) -> usize {
        self.position + 1
    }

    /// The schema this record was read with
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Value of a column; missing columns and short rows read as empty
    pub fn get(&self, name: &str) -> &FieldValue {
        self.schema
            .position(name)
            .and_then(|idx| self.values.get(idx))
            .unwrap_or(&EMPTY)
    }

    /// Value of a column as text, or `default` when it is empty
    pub fn text_or(&self, name: &str, default: &str) -> String {
        match self.get(name) {
            FieldValue::Empty => default.to_string(),
            value => value.to_string(),
        }
    }

    /// Value of the column playing `role`
    pub fn role(&self, role: FieldRole) -> &FieldValue {
        self.schema
            .column_for(role)
            .map(|column| self.get(column))
            .unwrap_or(&EMPTY)
    }

    /// Text of the column playing `role`, or `default` when it is empty
    pub fn role_text_or(&self, role: FieldRole, default: &str) -> String {
        match self.role(role) {
            FieldValue::Empty => default.to_string(),
            value => value.to_string(),
        }
    }

    /// Active/inactive classification, defaulting to active
    pub fn status_class(&self) -> StatusClass {
        match self.role(FieldRole::Status) {
            FieldValue::Empty => StatusClass::Active,
            value => StatusClass::classify(&value.to_string()),
        }
    }

    /// Name to show for the customer; empty when the table has none
    pub fn display_name(&self) -> String {
        self.role_text_or(FieldRole::CustomerName, "").trim().to_string()
    }

    /// Column name and value pairs in schema order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.schema
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, column)| (column.as_str(), self.values.get(idx).unwrap_or(&EMPTY)))
    }
}

/// Errors reading tabular input
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("IO error reading {path}: {source}", path = .0.display(), source = .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Malformed table: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unreadable spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Spreadsheet has no worksheet")]
    NoWorksheet,

    #[error("Table has no header row")]
    MissingHeader,
}

/// Inclusive, 1-based selection of rows to generate letters for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    start: usize,
    end: usize,
}

/// Invalid row selection
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("The table has no records")]
    NoRecords,

    #[error("Start row must be at least 1")]
    ZeroStart,

    #[error("Start row {start} is after end row {end}")]
    StartAfterEnd { start: usize, end: usize },

    #[error("End row {end} is past the last row ({total})")]
    EndOutOfRange { end: usize, total: usize },
}

impl RowRange {
    /// An unchecked range; see [`RowRange::validate`]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Build a range from optional bounds, defaulting to every row
    pub fn resolve(start: Option<usize>, end: Option<usize>, total: usize) -> Result<Self, RangeError> {
        if total == 0 {
            return Err(RangeError::NoRecords);
        }
        let range = Self {
            start: start.unwrap_or(1),
            end: end.unwrap_or(total),
        };
        range.validate(total)?;
        Ok(range)
    }

    /// Check the range against a table of `total` rows
    pub fn validate(&self, total: usize) -> Result<(), RangeError> {
        if total == 0 {
            return Err(RangeError::NoRecords);
        }
        if self.start == 0 {
            return Err(RangeError::ZeroStart);
        }
        if self.start > self.end {
            return Err(RangeError::StartAfterEnd {
                start: self.start,
                end: self.end,
            });
        }
        if self.end > total {
            return Err(RangeError::EndOutOfRange {
                end: self.end,
                total,
            });
        }
        Ok(())
    }

    /// First selected row (1-based)
    pub fn start(&self) -> usize {
        self.start
    }

    /// Last selected row (1-based, inclusive)
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of selected rows
    pub fn len(&self) -> usize {
        self.end + 1 - self.start
    }

    /// A range always selects at least one row
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// All records of a table, sharing one schema
#[derive(Debug, Clone)]
pub struct RecordSet {
    schema: Arc<Schema>,
    records: Vec<Record>,
}

/// Spreadsheet formats read through calamine, by file extension
const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

impl RecordSet {
    /// Read a table file, choosing the format by extension
    ///
    /// Excel and OpenDocument workbooks are read from their first worksheet;
    /// anything else is read as CSV.
    pub fn from_path(path: &Path) -> Result<Self, RecordError> {
        let is_spreadsheet = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                SPREADSHEET_EXTENSIONS
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            });
        if is_spreadsheet {
            Self::from_excel_path(path)
        } else {
            Self::from_csv_path(path)
        }
    }

    /// Read the first worksheet of a workbook; its first row is the header
    pub fn from_excel_path(path: &Path) -> Result<Self, RecordError> {
        if !path.exists() {
            return Err(RecordError::Io(
                path.to_path_buf(),
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ));
        }
        let workbook = calamine::open_workbook_auto(path)?;
        let set = Self::from_workbook(workbook)?;
        log::info!(
            "Loaded {} records with {} columns from {}",
            set.len(),
            set.schema.columns().len(),
            path.display()
        );
        Ok(set)
    }

    /// Read the first worksheet of an in-memory workbook
    pub fn from_excel_reader<RS: Read + Seek + Clone>(reader: RS) -> Result<Self, RecordError> {
        Self::from_workbook(calamine::open_workbook_auto_from_rs(reader)?)
    }

    fn from_workbook<RS: Read + Seek>(
        mut workbook: calamine::Sheets<RS>,
    ) -> Result<Self, RecordError> {
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(RecordError::NoWorksheet)??;

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .ok_or(RecordError::MissingHeader)?
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(RecordError::MissingHeader);
        }

        let mut rows: Vec<Vec<FieldValue>> = rows
            .map(|row| row.iter().map(FieldValue::from).collect())
            .collect();
        // Formatted but empty rows below the data
        while rows
            .last()
            .is_some_and(|row| row.iter().all(FieldValue::is_empty))
        {
            rows.pop();
        }
        Ok(Self::from_rows(headers, rows))
    }

    /// Read a CSV file with a header row
    pub fn from_csv_path(path: &Path) -> Result<Self, RecordError> {
        let file = std::fs::File::open(path).map_err(|e| RecordError::Io(path.to_path_buf(), e))?;
        let set = Self::from_csv_reader(file)?;
        log::info!(
            "Loaded {} records with {} columns from {}",
            set.len(),
            set.schema.columns().len(),
            path.display()
        );
        Ok(set)
    }

    /// Read CSV data with a header row from any reader
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, RecordError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(RecordError::MissingHeader);
        }

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(record.iter().map(FieldValue::from_cell).collect());
        }

        Ok(Self::from_rows(headers, rows))
    }

    /// Build a record set from in-memory rows
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<FieldValue>>) -> Self {
        let schema = Arc::new(Schema::new(columns));
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(position, values)| Record {
                position,
                schema: Arc::clone(&schema),
                values,
            })
            .collect();
        Self { schema, records }
    }

    /// The shared schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// All records in source order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The records selected by `range`
    pub fn select(&self, range: RowRange) -> Result<&[Record], RangeError> {
        range.validate(self.len())?;
        Ok(&self.records[range.start - 1..range.end])
    }
}
