//! Test command implementation.

use super::CommandResult;
use cassette_archive::read_cassette;
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct TestArgs {
    /// Cassette to test
    pub cassette: PathBuf,

    /// Show verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Totals gathered while reading a cassette.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TestSummary {
    pub entries: u64,
    pub negatives: u64,
    pub bytes: u64,
}

/// Read every entry of the cassette, failing on truncation or trailing data.
pub fn test_cassette(args: &TestArgs) -> Result<TestSummary, cassette_core::CassetteError> {
    let mut negatives = 0;
    let mut bytes = 0;
    let entries = read_cassette(&args.cassette, |entry| {
        bytes += entry.size;
        if entry.negative {
            negatives += 1;
        }
        if args.verbose {
            println!("  OK: {}", entry);
        }
        Ok(())
    })?;

    Ok(TestSummary {
        entries,
        negatives,
        bytes,
    })
}

pub fn cmd_test(args: &TestArgs) -> CommandResult {
    println!("Testing {}", args.cassette.display());

    match test_cassette(args) {
        Ok(summary) => {
            println!(
                "All {} entries OK ({} negative, {} bytes)",
                summary.entries, summary.negatives, summary.bytes
            );
            Ok(())
        }
        Err(e) if e.is_truncation() => {
            Err(format!("{} (the cassette is incomplete, try downloading it again)", e).into())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cassette_archive::{PendingEntry, write_cassette};
    use std::fs;

    #[test]
    fn test_summary() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("c.wav");
        write_cassette(
            &wav,
            &[
                PendingEntry::bytes("a", vec![0; 10]),
                PendingEntry::bytes("b", vec![0; 5]).with_negative(true),
            ],
        )
        .unwrap();

        let summary = test_cassette(&TestArgs {
            cassette: wav,
            verbose: false,
        })
        .unwrap();
        assert_eq!(
            summary,
            TestSummary {
                entries: 2,
                negatives: 1,
                bytes: 15,
            }
        );
    }

    #[test]
    fn test_truncated_cassette_fails() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("c.wav");
        write_cassette(&wav, &[PendingEntry::bytes("a", vec![0; 100])]).unwrap();

        let mut data = fs::read(&wav).unwrap();
        data.truncate(data.len() - 20);
        fs::write(&wav, data).unwrap();

        let args = TestArgs {
            cassette: wav,
            verbose: false,
        };
        assert!(test_cassette(&args).unwrap_err().is_truncation());
        assert!(cmd_test(&args).is_err());
    }
}
