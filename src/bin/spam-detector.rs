use std::path::PathBuf;
use std::process::ExitCode;

use chain_hash::detector::DetectorError;
use chain_hash::detector::SpamDetector;
use chain_hash::detector::Verdict;
use chain_hash::detector::parse_threshold;
use chain_hash::detector::read_message_file;
use clap::Parser;

#[derive(Parser, Debug)]
struct Args {
    /// CSV database of `phrase,score` lines.
    database: PathBuf,
    /// File holding the message to classify.
    message: PathBuf,
    /// Scores at or above this value are spam. Must be a positive decimal.
    threshold: String,
}

fn run(args: &Args) -> Result<Verdict, DetectorError> {
    let threshold = parse_threshold(&args.threshold)?;
    let detector = SpamDetector::from_csv_file(&args.database)?;
    let message = read_message_file(&args.message)?;
    Ok(detector.classify(&message, threshold))
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args) {
        Ok(verdict) => {
            println!("{verdict}");
            ExitCode::SUCCESS
        }
        Err(_) => {
            eprintln!("Invalid input");
            ExitCode::FAILURE
        }
    }
}
