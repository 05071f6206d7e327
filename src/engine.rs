use crate::converter::{Converter, Direction};
use crate::errors::{RowError, DATE_FORMAT};
use chrono::NaiveDate;
use csv::Trim;
use log::{trace, warn};
use std::io::{Read, Write};

/// What to do with a row whose date has no rate within the lookback window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissingRate {
    /// Stop processing and return the error.
    #[default]
    Abort,

    /// Log a warning, drop the row, and keep going.
    Skip,
}

/// Counts of rows handled by a single run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub converted: u64,
    pub skipped: u64,
}

/// An Engine streams headless `date,amount` CSV rows through a Converter
/// and writes the converted `date,amount` rows to an output sink.
pub struct Engine<'c, C: Converter + ?Sized> {
    converter: &'c C,
    direction: Direction,
    missing_rate: MissingRate,
}

impl<'c, C: Converter + ?Sized> Engine<'c, C> {
    pub fn new(converter: &'c C) -> Self {
        Self {
            converter,
            direction: Direction::default(),
            missing_rate: MissingRate::default(),
        }
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn missing_rate(mut self, missing_rate: MissingRate) -> Self {
        self.missing_rate = missing_rate;
        self
    }

    /// Converts every row read from `input` and writes the results to
    /// `output`, one row at a time.
    ///
    /// Rows that fail to decode stop processing immediately. Rows without a
    /// rate either stop processing or are skipped, depending on the
    /// configured MissingRate policy. Output is flushed after every row, so
    /// rows converted before an error are not lost.
    pub fn run<R: Read, W: Write>(&self, input: R, output: W) -> Result<Summary, RowError> {
        let mut summary = Summary::default();

        // The csv library handles setting up an io::BufReader so we don't
        // need to do that here.
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(false)
            .trim(Trim::All)
            .from_reader(input);
        let mut wtr = csv::Writer::from_writer(output);

        for (row, record) in (0u64..).zip(rdr.records()) {
            let record = record.map_err(|err| RowError::Read(row, err))?;

            let (raw_date, raw_amount) = match (record.get(0), record.get(1)) {
                (Some(date), Some(amount)) => (date, amount),
                _ => return Err(RowError::MissingField(row)),
            };

            let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT)
                .map_err(|err| RowError::Date(row, err))?;
            let amount: f64 = raw_amount
                .parse()
                .map_err(|err| RowError::Amount(row, err))?;

            let converted = match self.converter.convert(self.direction, date, amount) {
                Ok(converted) => converted,
                Err(err) if self.missing_rate == MissingRate::Skip => {
                    warn!("skipping row {}: {}", row, err);
                    summary.skipped += 1;
                    continue;
                }
                Err(err) => return Err(RowError::Conversion(row, err)),
            };

            wtr.write_record([raw_date, converted.to_string().as_str()])
                .map_err(|err| RowError::Write(row, err))?;
            wtr.flush()
                .map_err(|err| RowError::Write(row, err.into()))?;

            trace!("row {}: {} {} -> {}", row, raw_date, amount, converted);
            summary.converted += 1;
        }

        Ok(summary)
    }
}
