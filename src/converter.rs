use crate::errors::{ConverterError, RateNotFoundError};
use crate::rates::{DailyRates, RateTable};
use chrono::NaiveDate;
use std::borrow::Cow;

/// The direction of a conversion. Rates are quoted as units of currency B per
/// unit of currency A.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    /// Divide the amount by the rate.
    #[default]
    AToB,

    /// Multiply the amount by the rate.
    BToA,
}

/// Converts amounts between currency A and currency B on a given date.
pub trait Converter {
    fn a_to_b(&self, date: NaiveDate, amount: f64) -> Result<f64, RateNotFoundError>;

    fn b_to_a(&self, date: NaiveDate, amount: f64) -> Result<f64, RateNotFoundError>;

    fn convert(
        &self,
        direction: Direction,
        date: NaiveDate,
        amount: f64,
    ) -> Result<f64, RateNotFoundError> {
        match direction {
            Direction::AToB => self.a_to_b(date, amount),
            Direction::BToA => self.b_to_a(date, amount),
        }
    }
}

/// A Converter backed by a validated RateTable.
///
/// The table is either owned or borrowed from the bundled reference data,
/// which lives for the whole process.
#[derive(Clone, Debug, PartialEq)]
pub struct RateConverter {
    rates: Cow<'static, RateTable>,
}

impl RateConverter {
    /// Builds a converter from the provided rates, or from the bundled
    /// reference rates when none are provided.
    pub fn new(rates: Option<DailyRates>) -> Result<Self, ConverterError> {
        let rates = match rates {
            Some(rates) => Cow::Owned(RateTable::new(rates)?),
            None => Cow::Borrowed(RateTable::reference()?),
        };

        Ok(Self { rates })
    }

    pub fn from_table(table: RateTable) -> Self {
        Self {
            rates: Cow::Owned(table),
        }
    }

    pub fn table(&self) -> &RateTable {
        &self.rates
    }
}

impl Converter for RateConverter {
    fn a_to_b(&self, date: NaiveDate, amount: f64) -> Result<f64, RateNotFoundError> {
        let rate = self.rates.get_rate(date)?;
        Ok(amount / rate)
    }

    fn b_to_a(&self, date: NaiveDate, amount: f64) -> Result<f64, RateNotFoundError> {
        let rate = self.rates.get_rate(date)?;
        Ok(amount * rate)
    }
}
