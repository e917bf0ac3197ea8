//! Contents command implementation.

use super::CommandResult;
use crate::utils::entry_line;
use cassette_archive::scan_cassette;
use cassette_core::Entry;
use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ContentsArgs {
    /// Cassette to list
    pub cassette: PathBuf,

    /// Also list negative entries
    #[arg(short, long)]
    pub negatives: bool,

    /// Output as JSON (machine-readable)
    #[arg(short, long)]
    pub json: bool,
}

/// JSON serializable entry header.
#[derive(Debug, Serialize, Deserialize)]
struct EntryJson {
    name: String,
    size: u64,
    negative: bool,
}

impl From<&Entry> for EntryJson {
    fn from(entry: &Entry) -> Self {
        Self {
            name: entry.name.clone(),
            size: entry.size,
            negative: entry.negative,
        }
    }
}

/// JSON output for a cassette listing.
#[derive(Debug, Serialize, Deserialize)]
struct ContentsJson {
    cassette: String,
    count: u64,
    entries: Vec<EntryJson>,
}

/// Scan `cassette`, keeping negative entries only when asked to.
fn listed_entries(args: &ContentsArgs) -> Result<(u64, Vec<Entry>), Box<dyn std::error::Error>> {
    let mut entries = Vec::new();
    let count = scan_cassette(&args.cassette, |entry| {
        if args.negatives || !entry.negative {
            entries.push(entry);
        }
        Ok(())
    })?;
    Ok((count, entries))
}

pub fn cmd_contents(args: &ContentsArgs) -> CommandResult {
    let (count, entries) = listed_entries(args)?;

    if args.json {
        let output = ContentsJson {
            cassette: args.cassette.display().to_string(),
            count,
            entries: entries.iter().map(EntryJson::from).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for entry in &entries {
        println!("{}", entry_line(entry));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cassette_archive::{PendingEntry, write_cassette};

    #[test]
    fn test_negatives_hidden_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("c.wav");
        write_cassette(
            &wav,
            &[
                PendingEntry::bytes("a.txt", b"Hi".to_vec()),
                PendingEntry::bytes("b/c.bin", vec![0xFF]).with_negative(true),
            ],
        )
        .unwrap();

        let mut args = ContentsArgs {
            cassette: wav,
            negatives: false,
            json: false,
        };
        let (count, entries) = listed_entries(&args).unwrap();
        assert_eq!(count, 2);
        assert_eq!(entries.len(), 1);
        assert_eq!(entry_line(&entries[0]), "a.txt\t[2 bytes]");

        args.negatives = true;
        let (_, entries) = listed_entries(&args).unwrap();
        assert_eq!(entry_line(&entries[1]), "b/c.bin\t[1 bytes] (n)");
    }

    #[test]
    fn test_json_shape() {
        let output = ContentsJson {
            cassette: "c.wav".to_string(),
            count: 1,
            entries: vec![EntryJson::from(&Entry::header("a", true, 3))],
        };
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["entries"][0]["name"], "a");
        assert_eq!(value["entries"][0]["size"], 3);
        assert_eq!(value["entries"][0]["negative"], true);
    }
}
