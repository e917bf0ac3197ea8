//! Extract command implementation.

use super::CommandResult;
use crate::utils::{create_progress_bar, safe_join};
use cassette_archive::{read_cassette, scan_cassette};
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Cassette to extract
    pub cassette: PathBuf,

    /// Directory to extract into
    #[arg(short, long)]
    pub output: PathBuf,

    /// Empty the output directory first
    #[arg(short, long)]
    pub clear: bool,

    /// Also extract negative entries
    #[arg(short = 'k', long)]
    pub keep_negatives: bool,

    /// Show progress bar
    #[arg(short = 'P', long)]
    pub progress: bool,

    /// Show verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Prepare `output`, clearing it first if asked to.
fn prepare_output(output: &Path, clear: bool) -> CommandResult {
    if output.exists() && !output.is_dir() {
        return Err(format!("Output path {} is not a directory", output.display()).into());
    }
    if clear && output.exists() {
        log::info!("Clearing {}", output.display());
        fs::remove_dir_all(output)?;
    }
    fs::create_dir_all(output)?;
    Ok(())
}

pub fn cmd_extract(args: &ExtractArgs) -> CommandResult {
    prepare_output(&args.output, args.clear)?;

    println!(
        "Extracting {} to {}",
        args.cassette.display(),
        args.output.display()
    );

    // entry count for the progress bar
    let mut total = 0u64;
    if args.progress {
        scan_cassette(&args.cassette, |entry| {
            if args.keep_negatives || !entry.negative {
                total += 1;
            }
            Ok(())
        })?;
    }
    let pb = create_progress_bar(total, args.progress);
    pb.set_message("files");

    let mut extracted = 0usize;
    let mut failed = 0usize;
    read_cassette(&args.cassette, |entry| {
        if entry.negative && !args.keep_negatives {
            return Ok(());
        }

        let target = safe_join(&args.output, &entry.name)?;
        let result = target
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| fs::write(&target, entry.content().unwrap_or_default()));

        match result {
            Ok(()) => {
                extracted += 1;
                if args.verbose {
                    let line = format!("  Extracted: {} ({} bytes)", entry.name, entry.size);
                    if pb.is_hidden() {
                        println!("{}", line);
                    } else {
                        pb.println(line);
                    }
                }
            }
            Err(e) => {
                failed += 1;
                log::error!("Error extracting {} to {}: {}", entry.name, target.display(), e);
            }
        }
        pb.inc(1);
        Ok(())
    })?;
    pb.finish_with_message("Done");

    if failed > 0 {
        return Err(format!("{} of {} entries failed to extract", failed, extracted + failed).into());
    }
    println!("Extracted {} entries", extracted);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cassette_archive::{PendingEntry, write_cassette};
    use cassette_core::CassetteError;

    fn args(cassette: PathBuf, output: PathBuf) -> ExtractArgs {
        ExtractArgs {
            cassette,
            output,
            clear: false,
            keep_negatives: false,
            progress: false,
            verbose: false,
        }
    }

    fn sample(dir: &Path) -> PathBuf {
        let wav = dir.join("c.wav");
        write_cassette(
            &wav,
            &[
                PendingEntry::bytes("a.txt", b"Hi".to_vec()),
                PendingEntry::bytes("deep/b.bin", vec![1, 2, 3]),
                PendingEntry::bytes("neg.txt", b"n".to_vec()).with_negative(true),
            ],
        )
        .unwrap();
        wav
    }

    #[test]
    fn test_extract_skips_negatives() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        cmd_extract(&args(sample(dir.path()), out.clone())).unwrap();

        assert_eq!(fs::read(out.join("a.txt")).unwrap(), b"Hi");
        assert_eq!(fs::read(out.join("deep/b.bin")).unwrap(), vec![1, 2, 3]);
        assert!(!out.join("neg.txt").exists());
    }

    #[test]
    fn test_keep_negatives_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("stale"), "old").unwrap();

        let mut extract = args(sample(dir.path()), out.clone());
        extract.keep_negatives = true;
        extract.clear = true;
        cmd_extract(&extract).unwrap();

        assert!(!out.join("stale").exists());
        assert_eq!(fs::read(out.join("neg.txt")).unwrap(), b"n");
    }

    #[test]
    fn test_rejects_escaping_names() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("evil.wav");
        write_cassette(&wav, &[PendingEntry::bytes("../escape", b"x".to_vec())]).unwrap();

        let out = dir.path().join("out");
        let err = cmd_extract(&args(wav, out)).unwrap_err();
        let err = err.downcast::<CassetteError>().unwrap();
        assert!(matches!(*err, CassetteError::UnsafePath { .. }));
        assert!(!dir.path().join("escape").exists());
    }

    #[test]
    fn test_output_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, "").unwrap();
        assert!(cmd_extract(&args(sample(dir.path()), file)).is_err());
    }
}
