//! Utility functions for the CLI.

use cassette_core::{CassetteError, Entry};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Component, Path, PathBuf};

/// Create a progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░ ");
    pb.set_style(style);
    pb
}

/// Whether `path` carries the `.wav` extension cassettes are written with.
fn has_cassette_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
}

/// Append `.wav` unless the path already has it.
pub fn cassette_path(path: &Path) -> PathBuf {
    if has_cassette_extension(path) {
        path.to_path_buf()
    } else {
        let mut raw = path.as_os_str().to_owned();
        raw.push(".wav");
        PathBuf::from(raw)
    }
}

/// One line of a `contents` listing.
pub fn entry_line(entry: &Entry) -> String {
    let mut line = format!("{}\t[{} bytes]", entry.name, entry.size);
    if entry.negative {
        line.push_str(" (n)");
    }
    line
}

/// Resolve an entry name below `root`, refusing anything that could
/// escape it.
pub fn safe_join(root: &Path, name: &str) -> Result<PathBuf, CassetteError> {
    let relative = Path::new(name);
    let mut joined = root.to_path_buf();
    let mut depth = 0usize;

    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                joined.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(CassetteError::unsafe_path(name));
            }
        }
    }

    if depth == 0 {
        return Err(CassetteError::unsafe_path(name));
    }
    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cassette_path() {
        assert_eq!(cassette_path(Path::new("out")), PathBuf::from("out.wav"));
        assert_eq!(cassette_path(Path::new("out.wav")), PathBuf::from("out.wav"));
        assert_eq!(cassette_path(Path::new("OUT.WAV")), PathBuf::from("OUT.WAV"));
        assert_eq!(
            cassette_path(Path::new("dir/out.zip")),
            PathBuf::from("dir/out.zip.wav")
        );
    }

    #[test]
    fn test_entry_line() {
        assert_eq!(entry_line(&Entry::header("a.txt", false, 2)), "a.txt\t[2 bytes]");
        assert_eq!(
            entry_line(&Entry::header("b/c.bin", true, 1)),
            "b/c.bin\t[1 bytes] (n)"
        );
    }

    #[test]
    fn test_safe_join() {
        let root = Path::new("out");
        assert_eq!(
            safe_join(root, "textures/stone.png").unwrap(),
            PathBuf::from("out/textures/stone.png")
        );
        assert_eq!(safe_join(root, "./a").unwrap(), PathBuf::from("out/a"));

        for name in ["../evil", "a/../../evil", "/etc/passwd", "", "."] {
            assert!(
                matches!(safe_join(root, name), Err(CassetteError::UnsafePath { .. })),
                "{name:?} should be rejected"
            );
        }
    }
}
