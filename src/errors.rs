use chrono::NaiveDate;
use std::error::Error;
use std::fmt;
use std::fmt::Formatter;
use std::num::ParseFloatError;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// Returned when no rate exists for a requested date within the lookback
/// window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateNotFoundError {
    date: NaiveDate,
}

impl RateNotFoundError {
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }

    /// The date originally requested by the caller, before any weekend
    /// adjustment.
    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyTable,
    FutureDate { date: NaiveDate, rate: f64 },
    NonPositiveRate { date: NaiveDate, rate: f64 },
}

#[derive(Debug)]
pub enum LoadError {
    Csv(csv::Error),
    DuplicateDate(NaiveDate),
}

#[derive(Debug)]
pub enum ConverterError {
    Load(LoadError),
    Validation(ValidationError),
}

/// A failure while processing a single input row. The row index is zero-based.
#[derive(Debug)]
pub enum RowError {
    Read(u64, csv::Error),
    MissingField(u64),
    Date(u64, chrono::ParseError),
    Amount(u64, ParseFloatError),
    Conversion(u64, RateNotFoundError),
    Write(u64, csv::Error),
}

impl fmt::Display for RateNotFoundError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "no rate found for {}", self.date.format(DATE_FORMAT))
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyTable => write!(f, "rates shall not be empty"),
            ValidationError::FutureDate { date, rate } => write!(
                f,
                "historical rates are expected only, got: date={}, rate={}",
                date.format(DATE_FORMAT),
                rate
            ),
            ValidationError::NonPositiveRate { date, rate } => write!(
                f,
                "rate shall be positive, got: date={}, rate={}",
                date.format(DATE_FORMAT),
                rate
            ),
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Csv(err) => write!(f, "failed to read rate record: {}", err),
            LoadError::DuplicateDate(date) => write!(
                f,
                "duplicate rate for date {}",
                date.format(DATE_FORMAT)
            ),
        }
    }
}

impl fmt::Display for ConverterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConverterError::Load(err) => write!(f, "failed to load rates: {}", err),
            ConverterError::Validation(err) => write!(f, "invalid rates: {}", err),
        }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RowError::Read(row, err) => write!(f, "error reading csv row {}: {}", row, err),
            RowError::MissingField(row) => write!(
                f,
                "row {} MUST contain a date and an amount, but fewer columns were found",
                row
            ),
            RowError::Date(row, err) => {
                write!(f, "error parsing date in the row {}: {}", row, err)
            }
            RowError::Amount(row, err) => {
                write!(f, "error parsing amount in the row {}: {}", row, err)
            }
            RowError::Conversion(row, err) => {
                write!(f, "conversion error in the row {}. {}", row, err)
            }
            RowError::Write(row, err) => write!(f, "error writing the row {}: {}", row, err),
        }
    }
}

impl From<csv::Error> for LoadError {
    fn from(err: csv::Error) -> Self {
        LoadError::Csv(err)
    }
}

impl From<LoadError> for ConverterError {
    fn from(err: LoadError) -> Self {
        ConverterError::Load(err)
    }
}

impl From<ValidationError> for ConverterError {
    fn from(err: ValidationError) -> Self {
        ConverterError::Validation(err)
    }
}

impl Error for RateNotFoundError {}
impl Error for ValidationError {}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LoadError::Csv(err) => Some(err),
            LoadError::DuplicateDate(_) => None,
        }
    }
}

impl Error for ConverterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConverterError::Load(err) => Some(err),
            ConverterError::Validation(err) => Some(err),
        }
    }
}

impl Error for RowError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RowError::Read(_, err) | RowError::Write(_, err) => Some(err),
            RowError::MissingField(_) => None,
            RowError::Date(_, err) => Some(err),
            RowError::Amount(_, err) => Some(err),
            RowError::Conversion(_, err) => Some(err),
        }
    }
}
