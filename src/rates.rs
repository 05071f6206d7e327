use crate::errors::{ConverterError, LoadError, RateNotFoundError, ValidationError};
use chrono::{Datelike, NaiveDate, Utc, Weekday};
use csv::Trim;
use serde::Deserialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

/// Number of calendar days searched before the anchor date, in addition to
/// the anchor itself.
const LOOKBACK_DAYS: usize = 7;

/// ECB daily reference rates of the euro, quoted in US dollars. This is a
/// sample covering 2022-12-01 to 2023-01-13; longer periods need a rate file.
const REFERENCE_RATES: &str = include_str!("../data/rates_usd_eur.csv");

static REFERENCE_TABLE: OnceLock<RateTable> = OnceLock::new();

/// Unvalidated daily rates, keyed by calendar day. Each value is the ratio
/// of currency B to currency A.
pub type DailyRates = HashMap<NaiveDate, f64>;

#[derive(Debug, Deserialize)]
struct RateRecord {
    date: NaiveDate,
    rate: f64,
}

/// A validated, read-only table of daily rates.
///
/// A RateTable can only be obtained through validation, so every table is
/// non-empty, holds strictly positive rates, and contains no dates later
/// than the day it was built.
#[derive(Clone, Debug, PartialEq)]
pub struct RateTable {
    rates: DailyRates,
}

impl RateTable {
    /// Validates the provided rates and wraps them in a RateTable. Nothing is
    /// returned if validation fails.
    pub fn new(rates: DailyRates) -> Result<Self, ValidationError> {
        validate(&rates)?;
        Ok(Self { rates })
    }

    /// Returns the table built from the bundled reference dataset.
    ///
    /// The dataset is parsed and validated on first use and the resulting
    /// table is shared for the rest of the process.
    pub fn reference() -> Result<&'static RateTable, ConverterError> {
        if let Some(table) = REFERENCE_TABLE.get() {
            return Ok(table);
        }

        let table = RateTable::new(load_rates(REFERENCE_RATES.as_bytes())?)?;
        Ok(REFERENCE_TABLE.get_or_init(|| table))
    }

    /// Looks up the rate applicable on the provided date.
    ///
    /// Weekends are first rolled back to the preceding Friday, which becomes
    /// the anchor date. The anchor and up to seven calendar days before it
    /// are then probed in order and the first known rate is returned. The
    /// lookup never searches forward in time.
    pub fn get_rate(&self, date: NaiveDate) -> Result<f64, RateNotFoundError> {
        let not_found = || RateNotFoundError::new(date);

        let mut anchor = date;
        while is_weekend(anchor) {
            anchor = anchor.pred_opt().ok_or_else(not_found)?;
        }

        std::iter::successors(Some(anchor), NaiveDate::pred_opt)
            .take(LOOKBACK_DAYS + 1)
            .find_map(|day| self.rates.get(&day).copied())
            .ok_or_else(not_found)
    }

    pub fn rates(&self) -> &DailyRates {
        &self.rates
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Always false for a validated table.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rates.keys().min().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rates.keys().max().copied()
    }
}

/// Checks the provided rates against the current UTC day.
pub fn validate(rates: &DailyRates) -> Result<(), ValidationError> {
    validate_as_of(rates, Utc::now().date_naive())
}

/// Checks that the rates are non-empty, historical relative to `today`, and
/// strictly positive.
///
/// Entries are inspected in ascending date order so that the reported
/// offender does not depend on hash map iteration order.
pub fn validate_as_of(rates: &DailyRates, today: NaiveDate) -> Result<(), ValidationError> {
    if rates.is_empty() {
        return Err(ValidationError::EmptyTable);
    }

    let mut entries: Vec<(&NaiveDate, &f64)> = rates.iter().collect();
    entries.sort_unstable_by_key(|(date, _)| **date);

    for (&date, &rate) in entries {
        if date > today {
            return Err(ValidationError::FutureDate { date, rate });
        }

        // NaN compares false against everything, so reject it explicitly.
        if rate.is_nan() || rate <= 0.0 {
            return Err(ValidationError::NonPositiveRate { date, rate });
        }
    }

    Ok(())
}

/// Parses a `date,rate` CSV document into DailyRates.
///
/// The first line is expected to be a header. Dates are `YYYY-MM-DD`; a date
/// appearing twice is rejected rather than silently overwritten. The rates
/// are not validated here.
pub fn load_rates<R: Read>(reader: R) -> Result<DailyRates, LoadError> {
    let mut iter = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    collect_records(&mut iter)
}

/// Like `load_rates`, reading from the file at `path`.
pub fn load_rates_from_path<P: AsRef<Path>>(path: P) -> Result<DailyRates, LoadError> {
    let mut iter = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_path(path)?;

    collect_records(&mut iter)
}

fn collect_records<R: Read>(iter: &mut csv::Reader<R>) -> Result<DailyRates, LoadError> {
    let mut rates = DailyRates::new();

    for record in iter.deserialize() {
        let record: RateRecord = record?;
        match rates.entry(record.date) {
            Entry::Occupied(_) => return Err(LoadError::DuplicateDate(record.date)),
            Entry::Vacant(entry) => {
                entry.insert(record.rate);
            }
        };
    }

    Ok(rates)
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn table(entries: &[(NaiveDate, f64)]) -> RateTable {
        RateTable::new(entries.iter().copied().collect()).unwrap()
    }

    #[test]
    fn should_load_reference_table() {
        let reference = RateTable::reference().unwrap();

        // 2023-01-01 is a Sunday, so the rate comes from Friday 2022-12-30.
        assert_eq!(reference.get_rate(date(2023, 1, 1)), Ok(1.0666));
        assert!(!reference.is_empty());

        // Repeated calls hand out the same instance.
        assert!(std::ptr::eq(reference, RateTable::reference().unwrap()));
    }

    #[test]
    fn should_cover_only_bundled_sample_range() {
        let reference = RateTable::reference().unwrap();

        assert_eq!(reference.len(), 31);
        assert_eq!(reference.first_date(), Some(date(2022, 12, 1)));
        assert_eq!(reference.last_date(), Some(date(2023, 1, 13)));

        // Outside the sample, the bundled table has no answer.
        assert_eq!(
            reference.get_rate(date(2021, 6, 15)),
            Err(RateNotFoundError::new(date(2021, 6, 15)))
        );
        assert_eq!(
            reference.get_rate(date(2023, 6, 15)),
            Err(RateNotFoundError::new(date(2023, 6, 15)))
        );
    }

    #[test]
    fn should_fail_to_find_rate_far_before_reference_data() {
        let reference = RateTable::reference().unwrap();
        assert_eq!(
            reference.get_rate(NaiveDate::MIN),
            Err(RateNotFoundError::new(NaiveDate::MIN))
        );
    }

    #[test]
    fn should_reject_empty_rates() {
        assert_eq!(
            RateTable::new(DailyRates::new()).unwrap_err(),
            ValidationError::EmptyTable
        );
    }

    #[test]
    fn should_reject_future_rates() {
        let rates = DailyRates::from([(date(9999, 12, 31), 1.0666)]);
        assert_eq!(
            RateTable::new(rates).unwrap_err().to_string(),
            "historical rates are expected only, got: date=9999-12-31, rate=1.0666"
        );
    }

    #[test]
    fn should_reject_negative_rates() {
        let rates = DailyRates::from([(date(2000, 12, 31), -1.0666)]);
        assert_eq!(
            RateTable::new(rates).unwrap_err().to_string(),
            "rate shall be positive, got: date=2000-12-31, rate=-1.0666"
        );
    }

    #[test]
    fn should_reject_zero_and_nan_rates() {
        let zero = DailyRates::from([(date(2000, 12, 31), 0.0)]);
        assert!(matches!(
            RateTable::new(zero),
            Err(ValidationError::NonPositiveRate { .. })
        ));

        let nan = DailyRates::from([(date(2000, 12, 31), f64::NAN)]);
        assert!(matches!(
            RateTable::new(nan),
            Err(ValidationError::NonPositiveRate { .. })
        ));
    }

    #[test]
    fn should_report_earliest_offending_entry() {
        let rates = DailyRates::from([
            (date(2001, 1, 2), -2.0),
            (date(2001, 1, 1), -1.0),
            (date(2001, 1, 3), 1.0),
        ]);
        assert_eq!(
            validate(&rates),
            Err(ValidationError::NonPositiveRate {
                date: date(2001, 1, 1),
                rate: -1.0
            })
        );
    }

    #[test]
    fn should_accept_rate_dated_today() {
        let today = date(2023, 1, 6);
        let rates = DailyRates::from([(today, 1.0)]);
        assert!(validate_as_of(&rates, today).is_ok());
        assert!(validate_as_of(&rates, date(2023, 1, 5)).is_err());
    }

    #[test]
    fn should_return_rate_for_exact_weekday() {
        let rates = table(&[(date(2023, 1, 4), 1.0599)]);
        assert_eq!(rates.get_rate(date(2023, 1, 4)), Ok(1.0599));
    }

    #[test]
    fn should_roll_weekend_back_to_friday() {
        let friday = date(2023, 1, 6);
        let rates = table(&[(friday, 1.0666)]);

        assert_eq!(rates.get_rate(date(2023, 1, 7)), Ok(1.0666));
        assert_eq!(rates.get_rate(date(2023, 1, 8)), Ok(1.0666));
    }

    #[test]
    fn should_never_search_forward() {
        let rates = table(&[(date(2023, 1, 6), 1.0666)]);

        // Sunday 2023-01-01 anchors on Friday 2022-12-30, before the only rate.
        assert_eq!(
            rates.get_rate(date(2023, 1, 1)),
            Err(RateNotFoundError::new(date(2023, 1, 1)))
        );
    }

    #[test]
    fn should_bound_lookback_to_seven_days_before_anchor() {
        // Wednesday request, so the anchor is the request date itself.
        let request = date(2023, 1, 11);

        let within = table(&[(date(2023, 1, 4), 2.0)]);
        assert_eq!(within.get_rate(request), Ok(2.0));

        let beyond = table(&[(date(2023, 1, 3), 2.0)]);
        assert_eq!(
            beyond.get_rate(request),
            Err(RateNotFoundError::new(request))
        );
    }

    #[test]
    fn should_count_lookback_from_weekend_adjusted_anchor() {
        // Sunday 2023-01-15 anchors on Friday 2023-01-13; seven days before
        // the anchor is Friday 2023-01-06.
        let request = date(2023, 1, 15);

        let within = table(&[(date(2023, 1, 6), 1.05)]);
        assert_eq!(within.get_rate(request), Ok(1.05));

        let beyond = table(&[(date(2023, 1, 5), 1.05)]);
        assert_eq!(
            beyond.get_rate(request),
            Err(RateNotFoundError::new(request))
        );
    }

    #[test]
    fn should_prefer_most_recent_rate_in_window() {
        let rates = table(&[
            (date(2022, 12, 23), 1.0622),
            (date(2022, 12, 27), 1.0624),
        ]);

        // Monday 2022-12-26 was a holiday, so its nearest rate is the Friday.
        assert_eq!(rates.get_rate(date(2022, 12, 26)), Ok(1.0622));
        assert_eq!(rates.get_rate(date(2022, 12, 28)), Ok(1.0624));
    }

    #[test]
    fn should_load_rates_with_header() {
        let data = "date,rate\n2022-12-29, 1.0649\n2022-12-30,1.0666\n";
        let rates = load_rates(data.as_bytes()).unwrap();

        assert_eq!(rates.len(), 2);
        assert_eq!(rates.get(&date(2022, 12, 30)), Some(&1.0666));
    }

    #[test]
    fn should_fail_to_load_duplicate_dates() {
        let data = "date,rate\n2022-12-30,1.0\n2022-12-30,2.0\n";
        assert_eq!(
            load_rates(data.as_bytes()).unwrap_err().to_string(),
            "duplicate rate for date 2022-12-30"
        );
    }

    #[test]
    fn should_fail_to_load_malformed_dates() {
        let data = "date,rate\n30/12/2022,1.0\n";
        assert!(matches!(
            load_rates(data.as_bytes()),
            Err(LoadError::Csv(_))
        ));
    }

    #[test]
    fn should_load_rates_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "date,rate").unwrap();
        writeln!(file, "2022-12-30,1.0666").unwrap();

        let rates = load_rates_from_path(file.path()).unwrap();
        assert_eq!(rates, DailyRates::from([(date(2022, 12, 30), 1.0666)]));
    }

    fn past_date() -> impl Strategy<Value = NaiveDate> {
        (0i64..8_000).prop_map(|offset| date(2000, 1, 1) + chrono::Duration::days(offset))
    }

    fn valid_rates() -> impl Strategy<Value = DailyRates> {
        proptest::collection::hash_map(past_date(), 0.0001f64..1_000.0, 1..64)
    }

    proptest! {
        #[test]
        fn should_construct_from_any_valid_rates(rates in valid_rates()) {
            let table = RateTable::new(rates.clone()).unwrap();
            prop_assert_eq!(table.rates(), &rates);
        }

        #[test]
        fn should_reject_any_non_positive_rate(
            rates in valid_rates(),
            bad_date in past_date(),
            bad_rate in -1_000.0f64..=0.0,
        ) {
            let mut rates = rates;
            rates.insert(bad_date, bad_rate);
            let is_non_positive = matches!(
                RateTable::new(rates),
                Err(ValidationError::NonPositiveRate { .. })
            );
            prop_assert!(is_non_positive);
        }

        #[test]
        fn should_reject_any_future_rate(
            rates in valid_rates(),
            days_ahead in 1i64..10_000,
            rate in 0.0001f64..1_000.0,
        ) {
            let today = date(2022, 12, 31);
            let mut rates = rates;
            rates.insert(today + chrono::Duration::days(days_ahead), rate);
            let is_future = matches!(
                validate_as_of(&rates, today),
                Err(ValidationError::FutureDate { .. })
            );
            prop_assert!(is_future);
        }

        #[test]
        fn should_answer_weekend_with_friday_rate(
            weeks in 0i64..1_000,
            rate in 0.0001f64..1_000.0,
        ) {
            // 2000-01-07 was a Friday.
            let friday = date(2000, 1, 7) + chrono::Duration::weeks(weeks);
            let rates = table(&[(friday, rate)]);

            prop_assert_eq!(rates.get_rate(friday.succ_opt().unwrap()), Ok(rate));
            prop_assert_eq!(rates.get_rate(friday + chrono::Duration::days(2)), Ok(rate));
        }
    }
}
