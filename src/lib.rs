//! Converts amounts between two currencies using historical daily rates.
//!
//! Rates are looked up by calendar day. Weekends roll back to the preceding
//! Friday and gaps in the table are bridged by searching up to seven days
//! further back.

pub mod args;
pub mod converter;
pub mod engine;
pub mod errors;
pub mod rates;

pub use converter::{Converter, Direction, RateConverter};
pub use engine::{Engine, MissingRate, Summary};
pub use rates::{DailyRates, RateTable};
