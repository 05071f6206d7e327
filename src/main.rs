use env_logger::Env;
use log::{debug, error, info};
use std::error::Error;
use std::fs::File;
use std::io::{self, Read, Write};
use std::process;
use usd2eur::args::Args;
use usd2eur::errors::ConverterError;
use usd2eur::rates::load_rates_from_path;
use usd2eur::{Direction, Engine, MissingRate, RateConverter, Summary};

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    if let Err(err) = run(Args::parse()) {
        error!("{}", err);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let converter = build_converter(args.rates.as_deref())?;

    let table = converter.table();
    if let (Some(first), Some(last)) = (table.first_date(), table.last_date()) {
        debug!("loaded {} rates from {} to {}", table.len(), first, last);
    }

    let input = open_input(args.input.as_deref())?;
    let output = open_output(args.output.as_deref())?;
    let summary = convert(&converter, &args, input, output)?;

    info!(
        "converted {} rows, skipped {}",
        summary.converted, summary.skipped
    );

    Ok(())
}

/// Loads the rate file at `path`, or falls back to the bundled rates.
fn build_converter(path: Option<&str>) -> Result<RateConverter, ConverterError> {
    let rates = match path {
        Some(path) => Some(load_rates_from_path(path)?),
        None => None,
    };

    RateConverter::new(rates)
}

fn open_input(path: Option<&str>) -> io::Result<Box<dyn Read>> {
    Ok(match path {
        Some(path) => Box::new(File::open(path)?),
        None => Box::new(io::stdin()),
    })
}

/// Creates (or truncates) the file at `path`, or writes to stdout.
fn open_output(path: Option<&str>) -> io::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout()),
    })
}

fn convert<R: Read, W: Write>(
    converter: &RateConverter,
    args: &Args,
    input: R,
    output: W,
) -> Result<Summary, Box<dyn Error>> {
    let direction = if args.b2a {
        Direction::BToA
    } else {
        Direction::AToB
    };
    let missing_rate = if args.skip_missing {
        MissingRate::Skip
    } else {
        MissingRate::Abort
    };

    Ok(Engine::new(converter)
        .direction(direction)
        .missing_rate(missing_rate)
        .run(input, output)?)
}
