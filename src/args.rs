use clap::{App, Arg};
use std::ffi::OsString;

pub struct Args {
    pub input: Option<String>,
    pub output: Option<String>,
    pub rates: Option<String>,
    pub b2a: bool,
    pub skip_missing: bool,
}

impl Args {
    pub fn parse() -> Self {
        Self::from_matches(&app().get_matches())
    }

    /// Parses the provided arguments, returning clap's error instead of
    /// exiting the process. The first item is the program name.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = app().get_matches_from_safe(args)?;
        Ok(Self::from_matches(&matches))
    }

    fn from_matches(matches: &clap::ArgMatches) -> Self {
        Self {
            input: matches.value_of("input").map(String::from),
            output: matches.value_of("output").map(String::from),
            rates: matches.value_of("rates").map(String::from),
            b2a: matches.is_present("b2a"),
            skip_missing: matches.is_present("skip_missing"),
        }
    }
}

fn app() -> App<'static, 'static> {
    App::new("usd2eur")
        .version("0.1.0")
        .about("Tool to convert USD to EUR using historical daily rates.")
        .arg(
            Arg::with_name("input")
                .short("i")
                .long("input")
                .takes_value(true)
                .value_name("FILE")
                .help("path to input headless csv with the structure col0:date, col1:amount. If empty, stdin will be read"),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .value_name("FILE")
                .help("path to output csv. If empty, result will be printed to stdout"),
        )
        .arg(
            Arg::with_name("rates")
                .short("r")
                .long("rates")
                .takes_value(true)
                .value_name("FILE")
                .help("path to a csv of daily rates with a date,rate header. If empty, the bundled rates are used, which cover 2022-12-01 to 2023-01-13 only"),
        )
        .arg(Arg::with_name("b2a").long("b2a").help("convert EUR to USD"))
        .arg(
            Arg::with_name("skip_missing")
                .long("skip-missing")
                .help("skip rows without a known rate instead of aborting"),
        )
}
