// Copyright (c) 2023 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

#![allow(dead_code)]

use std::io::{Cursor, Read, Write};

use sync_zip::base::read::seek::ZipFileReader;
use sync_zip::base::write::ZipFileWriter;
use sync_zip::{Compression, ZipEntryBuilder};

const FILE_LIST: &[&str] = &[
    "sample_data/alpha/back_to_front.txt",
    "sample_data/alpha/front_to_back.txt",
    "sample_data/numeric/forward.txt",
    "sample_data/numeric/reverse.txt",
];

/// Returns the contents of a sample file, generated so that each compresses well.
pub fn sample_content(fname: &str) -> String {
    match fname {
        "sample_data/alpha/back_to_front.txt" => ('a'..='z').rev().map(|c| c.to_string().repeat(40) + "\n").collect(),
        "sample_data/alpha/front_to_back.txt" => ('a'..='z').map(|c| c.to_string().repeat(40) + "\n").collect(),
        "sample_data/numeric/forward.txt" => (0..1000).map(|n| format!("{n}\n")).collect(),
        "sample_data/numeric/reverse.txt" => (0..1000).rev().map(|n| format!("{n}\n")).collect(),
        _ => panic!("unknown sample file {fname}"),
    }
}

pub fn compress_to_mem(compress: Compression) -> Vec<u8> {
    let mut writer = ZipFileWriter::new(Cursor::new(Vec::with_capacity(10_000)));

    for fname in FILE_LIST {
        let content = sample_content(fname);
        let opts = ZipEntryBuilder::new(*fname, compress);

        match compress {
            Compression::Stored => writer.create_entry(opts).unwrap(),
            #[cfg(feature = "deflate")]
            Compression::Deflate => writer.create_entry_with(opts, sync_zip::DeflateCompressor::new()).unwrap(),
            _ => panic!("no compressor available for {compress:?}"),
        }

        writer.write(content.as_bytes()).unwrap();
        writer.close().unwrap();
    }

    writer.close_archive().unwrap();
    writer.into_inner().into_inner()
}

/// Builds an archive of the sample files with the `zip` crate.
pub fn compress_with_zip_crate(method: zip::CompressionMethod) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default().compression_method(method);

    for fname in FILE_LIST {
        zip.start_file(*fname, options).unwrap();
        zip.write_all(sample_content(fname).as_bytes()).unwrap();
    }

    zip.finish().unwrap().into_inner()
}

/// Decodes an entry's raw data by its compression method.
pub fn decompress(compression: Compression, raw: Vec<u8>) -> String {
    let mut output = String::new();

    match compression {
        Compression::Stored => output = String::from_utf8(raw).unwrap(),
        Compression::Deflate => {
            flate2::read::DeflateDecoder::new(raw.as_slice()).read_to_string(&mut output).unwrap();
        }
        other => panic!("unexpected compression {other:?}"),
    }

    output
}

pub fn check_decompress_mem(zip_data: Vec<u8>) {
    let mut zip = ZipFileReader::new(Cursor::new(zip_data)).unwrap();
    assert_eq!(zip.entries().len(), FILE_LIST.len());

    while zip.next_entry().unwrap() {
        let entry = zip.header().cloned().unwrap();
        if entry.dir() {
            continue;
        }

        let fname = entry.filename_str().unwrap().to_string();
        let mut raw = Vec::new();
        zip.read_to_end(&mut raw).unwrap();

        let output = decompress(entry.compression(), raw);
        assert_eq!(output.len() as u64, entry.uncompressed_size().unwrap());
        assert_eq!(crc32fast::hash(output.as_bytes()), entry.crc32());

        let expected = sample_content(&fname);
        assert_eq!(output, expected, "for {fname}, expect zip data to match file data");
    }
}

/// Reads an archive back with the `zip` crate.
pub fn check_decompress_zip_crate(zip_data: Vec<u8>) {
    let mut zip = zip::ZipArchive::new(Cursor::new(zip_data)).unwrap();
    assert_eq!(zip.len(), FILE_LIST.len());

    for fname in FILE_LIST {
        let mut file = zip.by_name(fname).unwrap();
        let mut output = String::new();
        file.read_to_string(&mut output).unwrap();

        assert_eq!(output, sample_content(fname), "for {fname}, expect zip data to match file data");
    }
}
