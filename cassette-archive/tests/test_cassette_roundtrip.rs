use cassette_archive::archive::read_all;
use cassette_archive::{
    ArchiveReader, CassetteBuilder, PathFilter, PendingEntry, TrackIndex, assert_drained,
    read_archive_fully, read_cassette, scan_cassette, write_archive, write_cassette,
};
use cassette_core::{CassetteError, Entry, NAK};
use proptest::prelude::*;
use std::fs;

#[test]
fn test_directory_to_cassette_and_back() -> Result<(), Box<dyn std::error::Error>> {
    let source = tempfile::tempdir()?;
    fs::create_dir_all(source.path().join("textures/block"))?;
    fs::write(source.path().join("textures/block/stone.png"), vec![0x89; 1000])?;
    fs::write(source.path().join("textures/block/stone.txt"), "ignored")?;
    fs::write(source.path().join("pack.mcmeta"), "{\"pack\":{}}")?;

    let extras = tempfile::tempdir()?;
    fs::write(extras.path().join("readme.md"), "# extras")?;

    let mut builder = CassetteBuilder::new();
    builder
        .add_directory(source.path(), Some(PathFilter::exclude("**/*.txt")?))?
        .add_negative_directory(extras.path(), None)?;

    let output = tempfile::tempdir()?;
    let wav = output.path().join("pack.wav");
    let frames = builder.write(&wav)?;

    // 44 byte header, data, optional pad byte
    let file_len = fs::metadata(&wav)?.len();
    assert_eq!(file_len, 44 + frames + (frames & 1));

    let mut listed = Vec::new();
    let count = scan_cassette(&wav, |entry| {
        listed.push(entry.to_string());
        Ok(())
    })?;
    assert_eq!(count, 3);
    assert_eq!(
        listed,
        [
            "pack.mcmeta, 11 bytes",
            "textures/block/stone.png, 1000 bytes",
            "[readme.md], 8 bytes",
        ]
    );

    let mut contents = Vec::new();
    read_cassette(&wav, |entry| {
        contents.push(entry);
        Ok(())
    })?;
    assert_eq!(contents[1].content(), Some(&[0x89; 1000][..]));
    assert_eq!(contents[2], Entry::new_negative("readme.md", b"# extras".to_vec()));

    let index = TrackIndex::load(&wav)?;
    assert_eq!(index.len(), 2);
    assert_eq!(index.get("/pack.mcmeta"), Some(&b"{\"pack\":{}}"[..]));
    assert!(index.get("/readme.md").is_none());
    Ok(())
}

#[test]
fn test_write_cassette_from_pending_files() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("data.bin");
    fs::write(&file, [1, 2, 3])?;

    let wav = dir.path().join("out.wav");
    write_cassette(
        &wav,
        &[
            PendingEntry::file("data.bin", &file),
            PendingEntry::bytes("inline", b"xyz".to_vec()).with_negative(true),
        ],
    )?;

    let index = TrackIndex::load(&wav)?;
    assert_eq!(index.get("/data.bin"), Some(&[1, 2, 3][..]));
    assert_eq!(index.len(), 1);
    Ok(())
}

#[test]
fn test_missing_source_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.wav");
    let err = write_cassette(
        &out,
        &[
            PendingEntry::bytes("here", vec![7; 64]),
            PendingEntry::file("gone", dir.path().join("gone")),
        ],
    )
    .unwrap_err();
    assert!(matches!(err, CassetteError::Io(_)));
    assert!(!out.exists());
}

#[test]
fn test_every_content_is_byte_aligned() {
    let entries: Vec<_> = (0..12)
        .map(|i| PendingEntry::bytes("n".repeat(i), vec![0xA5; i]))
        .collect();
    let mut raw = Vec::new();
    write_archive(&mut raw, &entries).unwrap();

    // the last byte of every entry is its final content byte
    let mut reader = ArchiveReader::new(&raw[..]);
    assert_eq!(reader.read_count().unwrap(), 12);
    for i in 0..12 {
        let entry = reader.read_entry().unwrap();
        assert_eq!(entry.content(), Some(&vec![0xA5; i][..]));
        assert_eq!(reader.bit_position() % 8, 0);
    }
    assert_drained(&mut reader).unwrap();
}

#[test]
fn test_nak_suffix_is_ambiguous() {
    let name = format!("weird{}", char::from(NAK));
    let mut raw = Vec::new();
    write_archive(&mut raw, &[PendingEntry::bytes(name, vec![0])]).unwrap();

    let entries = read_all(&raw).unwrap();
    assert_eq!(entries[0].name, "weird");
    assert!(entries[0].negative);
}

#[test]
fn test_truncation_and_trailing_data() {
    let mut raw = Vec::new();
    write_archive(&mut raw, &[PendingEntry::bytes("file", vec![7; 32])]).unwrap();

    let mut truncated = raw.clone();
    truncated.truncate(raw.len() - 1);
    assert!(read_archive_fully(&truncated[..], |_| Ok(())).unwrap_err().is_truncation());

    let mut padded = raw.clone();
    padded.extend_from_slice(&[0, 0]);
    let err = read_archive_fully(&padded[..], |_| Ok(())).unwrap_err();
    assert!(matches!(err, CassetteError::NotDrained { remaining: 2 }));
}

fn entry_strategy() -> impl Strategy<Value = (String, bool, Vec<u8>)> {
    (
        "[a-zA-Z0-9_./-]{0,40}",
        any::<bool>(),
        prop::collection::vec(any::<u8>(), 0..200),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_archive_roundtrip(entries in prop::collection::vec(entry_strategy(), 0..8)) {
        let pending: Vec<_> = entries
            .iter()
            .map(|(name, negative, data)| {
                PendingEntry::bytes(name.clone(), data.clone()).with_negative(*negative)
            })
            .collect();

        let mut raw = Vec::new();
        let frames = write_archive(&mut raw, &pending).unwrap();
        prop_assert_eq!(frames, raw.len() as u64);

        let decoded = read_all(&raw).unwrap();
        prop_assert_eq!(decoded.len(), entries.len());
        for (entry, (name, negative, data)) in decoded.iter().zip(&entries) {
            prop_assert_eq!(&entry.name, name);
            prop_assert_eq!(entry.negative, *negative);
            prop_assert_eq!(entry.content(), Some(&data[..]));
        }
    }
}
