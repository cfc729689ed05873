// Copyright (c) 2023 Harry [Majored] [hello@majored.pw]
// Copyright (c) 2023 Cognite AS
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;

use crate::base::read::seek::ZipFileReader;
use crate::tests::init_logger;

const ZIP64_ZIP_CONTENTS: &str = "Hello World!\n";

/// Builds an archive containing one file named "-" with a zip64 extended field header.
fn generate_zip64_zip() -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored).large_file(true);

    zip.start_file("-", options).unwrap();
    zip.write_all(ZIP64_ZIP_CONTENTS.as_bytes()).unwrap();

    zip.finish().unwrap().into_inner()
}

/// Builds an archive containing more than 2^16 entries, each with the contents "\n".
fn generate_zip64many_zip() -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    for i in 0..2_u32.pow(16) + 1 {
        zip.start_file(format!("{i}.txt"), options).unwrap();
        zip.write_all(b"\n").unwrap();
    }

    zip.finish().unwrap().into_inner()
}

/// Tests opening and reading a zip64 archive.
#[test]
fn test_read_zip64_archive() {
    init_logger();

    let data = generate_zip64_zip();

    let mut reader = ZipFileReader::new(Cursor::new(data)).unwrap();
    assert!(reader.next_entry().unwrap());

    let header = reader.header().unwrap();
    assert_eq!(header.filename(), b"-");
    assert_eq!(header.uncompressed_size(), Some(ZIP64_ZIP_CONTENTS.len() as u64));

    let mut read_data = String::new();
    reader.read_to_string(&mut read_data).expect("read failed");

    assert_eq!(
        read_data.chars().count(),
        ZIP64_ZIP_CONTENTS.chars().count(),
        "{read_data:?} != {ZIP64_ZIP_CONTENTS:?}"
    );
    assert_eq!(read_data, ZIP64_ZIP_CONTENTS);
    assert!(!reader.next_entry().unwrap());
}

/// Test reading a generated zip64 archive that contains more than 2^16 entries.
#[test]
fn test_read_zip64_archive_many_entries() {
    init_logger();

    let data = generate_zip64many_zip();

    let mut reader = ZipFileReader::new(Cursor::new(data)).unwrap();
    assert!(reader.file().zip64());
    assert_eq!(reader.entries().len(), 2_usize.pow(16) + 1);

    // Verify that each entry exists and is has the contents "\n"
    for i in 0..2_u32.pow(16) + 1 {
        assert_eq!(reader.entries()[i as usize].filename(), format!("{i}.txt").as_bytes());

        reader.select_index(i as usize).unwrap();
        let mut contents = String::new();
        reader.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "\n");
    }
}
