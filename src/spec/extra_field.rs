// Copyright Cognite AS, 2023

//! Extensible data fields appended to local file headers and central directory records.
//!
//! A chain is a sequence of `(id, size, payload)` records. [`decode_chain`] splits a chain into raw records and
//! [`parse_extra_fields`] interprets the ones this crate knows about; unknown ids are retained as-is.

use crate::error::{Result as ZipResult, ZipError};
use crate::spec::codec::{raw, Record};
use crate::spec::consts::NON_ZIP64_MAX_SIZE;

/// 2 byte header ids
/// Ref https://github.com/Majored/rs-async-zip/blob/main/SPECIFICATION.md#452
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HeaderId(pub u16);

impl HeaderId {
    pub const ZIP64_EXTENDED_INFORMATION_EXTRA_FIELD: HeaderId = HeaderId(0x0001);
    pub const EXTENDED_TIMESTAMP_EXTRA_FIELD: HeaderId = HeaderId(0x5455);
    pub const INFO_ZIP_UNIX_EXTRA_FIELD: HeaderId = HeaderId(0x7855);
}

impl From<u16> for HeaderId {
    fn from(value: u16) -> Self {
        HeaderId(value)
    }
}

impl From<HeaderId> for u16 {
    fn from(value: HeaderId) -> Self {
        value.0
    }
}

raw! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    RawExtraFieldHeader {
        header_id: u16,
        data_size: u16
    }
}

/// A single undecoded record of an extra field chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtraFieldRecord {
    pub header_id: HeaderId,
    pub data: Vec<u8>,
}

/// Which header an extra field belongs to. Some fields carry less data in the central directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtraFieldVariant {
    Local,
    Central,
}

/// Represents each extra field.
/// Not strictly part of the spec, but is the most useful way to represent the data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtraField {
    Zip64ExtendedInformation(Zip64ExtendedInformationExtraField),
    ExtendedTimestamp(ExtendedTimestampExtraField),
    InfoZipUnix(InfoZipUnixExtraField),
    Unknown(ExtraFieldRecord),
}

/// An extended information header for Zip64.
/// This field is used both for local file headers and central directory records.
/// https://github.com/Majored/rs-async-zip/blob/main/SPECIFICATION.md#453
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Zip64ExtendedInformationExtraField {
    pub uncompressed_size: Option<u64>,
    pub compressed_size: Option<u64>,
    pub relative_header_offset: Option<u64>,
    pub disk_start_number: Option<u32>,
}

/// The Info-ZIP extended timestamp field, holding Unix times in seconds.
///
/// The central directory variant only ever carries the modification time, though its flags still describe every
/// time present in the local variant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtendedTimestampExtraField {
    pub modification_time: Option<i32>,
    pub access_time: Option<i32>,
    pub creation_time: Option<i32>,
}

/// The Info-ZIP "Unix2" field holding 16-bit owner ids. The central directory variant has no payload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InfoZipUnixExtraField {
    pub ids: Option<(u16, u16)>,
}

/// Which 32-bit header values held the ZIP64 sentinel, and so which values a ZIP64 field carries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Zip64Sentinels {
    pub uncompressed_size: bool,
    pub compressed_size: bool,
    pub relative_header_offset: bool,
    pub disk_start_number: bool,
}

impl Zip64Sentinels {
    pub fn new(uncompressed_size: u32, compressed_size: u32) -> Self {
        Self {
            uncompressed_size: uncompressed_size == NON_ZIP64_MAX_SIZE,
            compressed_size: compressed_size == NON_ZIP64_MAX_SIZE,
            ..Default::default()
        }
    }

    pub fn with_offset(mut self, relative_header_offset: u32, disk_start_number: u16) -> Self {
        self.relative_header_offset = relative_header_offset == NON_ZIP64_MAX_SIZE;
        self.disk_start_number = disk_start_number == u16::MAX;
        self
    }
}

const TIMESTAMP_MODIFICATION_BIT: u8 = 0x1;
const TIMESTAMP_ACCESS_BIT: u8 = 0x2;
const TIMESTAMP_CREATION_BIT: u8 = 0x4;

/// Splits an extra field chain into its records.
///
/// A record whose declared size overruns the remaining bytes is a hard failure rather than being truncated.
pub fn decode_chain(mut data: &[u8]) -> ZipResult<Vec<ExtraFieldRecord>> {
    let mut records = Vec::new();

    while !data.is_empty() {
        let header = RawExtraFieldHeader::decode_from(data).map_err(|_| ZipError::TruncatedExtraField)?;
        let end = RawExtraFieldHeader::LENGTH + header.data_size as usize;

        if data.len() < end {
            return Err(ZipError::TruncatedExtraField);
        }

        records.push(ExtraFieldRecord {
            header_id: header.header_id.into(),
            data: data[RawExtraFieldHeader::LENGTH..end].to_vec(),
        });
        data = &data[end..];
    }

    Ok(records)
}

/// Parses an extra field chain, interpreting each record by its header id.
pub fn parse_extra_fields(data: &[u8], sentinels: Zip64Sentinels) -> ZipResult<Vec<ExtraField>> {
    decode_chain(data)?.into_iter().map(|record| extra_field_from_record(record, sentinels)).collect()
}

fn extra_field_from_record(record: ExtraFieldRecord, sentinels: Zip64Sentinels) -> ZipResult<ExtraField> {
    match record.header_id {
        HeaderId::ZIP64_EXTENDED_INFORMATION_EXTRA_FIELD => Ok(ExtraField::Zip64ExtendedInformation(
            zip64_extended_information_field_from_bytes(&record.data, sentinels)?,
        )),
        HeaderId::EXTENDED_TIMESTAMP_EXTRA_FIELD => {
            Ok(ExtraField::ExtendedTimestamp(extended_timestamp_field_from_bytes(&record.data)))
        }
        HeaderId::INFO_ZIP_UNIX_EXTRA_FIELD => Ok(ExtraField::InfoZipUnix(info_zip_unix_field_from_bytes(&record.data))),
        _ => Ok(ExtraField::Unknown(record)),
    }
}

/// Parse a zip64 extra field from bytes.
/// The content of "data" should exclude the header.
///
/// Values are only present for the header fields which held the sentinel, in a fixed order.
fn zip64_extended_information_field_from_bytes(
    data: &[u8],
    sentinels: Zip64Sentinels,
) -> ZipResult<Zip64ExtendedInformationExtraField> {
    let mut field = Zip64ExtendedInformationExtraField::default();
    let mut current = data;

    if sentinels.uncompressed_size {
        field.uncompressed_size = Some(take_u64(&mut current)?);
    }
    if sentinels.compressed_size {
        field.compressed_size = Some(take_u64(&mut current)?);
    }
    if sentinels.relative_header_offset {
        field.relative_header_offset = Some(take_u64(&mut current)?);
    }
    if sentinels.disk_start_number {
        if current.len() < 4 {
            return Err(ZipError::Zip64ExtendedFieldIncomplete);
        }
        field.disk_start_number = Some(u32::from_le_bytes([current[0], current[1], current[2], current[3]]));
    }

    Ok(field)
}

fn take_u64(data: &mut &[u8]) -> ZipResult<u64> {
    if data.len() < 8 {
        return Err(ZipError::Zip64ExtendedFieldIncomplete);
    }

    let mut bytes = [0; 8];
    bytes.copy_from_slice(&data[..8]);
    *data = &data[8..];

    Ok(u64::from_le_bytes(bytes))
}

fn extended_timestamp_field_from_bytes(data: &[u8]) -> ExtendedTimestampExtraField {
    let mut field = ExtendedTimestampExtraField::default();
    let Some((&flags, mut current)) = data.split_first() else {
        return field;
    };

    for (bit, slot) in [
        (TIMESTAMP_MODIFICATION_BIT, &mut field.modification_time),
        (TIMESTAMP_ACCESS_BIT, &mut field.access_time),
        (TIMESTAMP_CREATION_BIT, &mut field.creation_time),
    ] {
        if flags & bit == 0 {
            continue;
        }
        // The central variant declares times it doesn't carry.
        if current.len() < 4 {
            break;
        }

        *slot = Some(i32::from_le_bytes([current[0], current[1], current[2], current[3]]));
        current = &current[4..];
    }

    field
}

fn info_zip_unix_field_from_bytes(data: &[u8]) -> InfoZipUnixExtraField {
    match data {
        [uid_lo, uid_hi, gid_lo, gid_hi, ..] => InfoZipUnixExtraField {
            ids: Some((u16::from_le_bytes([*uid_lo, *uid_hi]), u16::from_le_bytes([*gid_lo, *gid_hi]))),
        },
        _ => InfoZipUnixExtraField { ids: None },
    }
}

impl ExtraField {
    /// Converts this field into its undecoded record form.
    pub fn to_record(&self, variant: ExtraFieldVariant) -> ExtraFieldRecord {
        match self {
            ExtraField::Zip64ExtendedInformation(field) => ExtraFieldRecord {
                header_id: HeaderId::ZIP64_EXTENDED_INFORMATION_EXTRA_FIELD,
                data: field.as_bytes(),
            },
            ExtraField::ExtendedTimestamp(field) => {
                ExtraFieldRecord { header_id: HeaderId::EXTENDED_TIMESTAMP_EXTRA_FIELD, data: field.as_bytes(variant) }
            }
            ExtraField::InfoZipUnix(field) => {
                ExtraFieldRecord { header_id: HeaderId::INFO_ZIP_UNIX_EXTRA_FIELD, data: field.as_bytes(variant) }
            }
            ExtraField::Unknown(record) => record.clone(),
        }
    }
}

impl Zip64ExtendedInformationExtraField {
    fn as_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(28);

        for value in [self.uncompressed_size, self.compressed_size, self.relative_header_offset].into_iter().flatten() {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        if let Some(disk_start_number) = self.disk_start_number {
            bytes.extend_from_slice(&disk_start_number.to_le_bytes());
        }

        bytes
    }
}

impl ExtendedTimestampExtraField {
    fn flags(&self) -> u8 {
        let mut flags = 0;

        if self.modification_time.is_some() {
            flags |= TIMESTAMP_MODIFICATION_BIT;
        }
        if self.access_time.is_some() {
            flags |= TIMESTAMP_ACCESS_BIT;
        }
        if self.creation_time.is_some() {
            flags |= TIMESTAMP_CREATION_BIT;
        }

        flags
    }

    fn as_bytes(&self, variant: ExtraFieldVariant) -> Vec<u8> {
        let mut bytes = vec![self.flags()];

        let times = match variant {
            ExtraFieldVariant::Local => vec![self.modification_time, self.access_time, self.creation_time],
            ExtraFieldVariant::Central => vec![self.modification_time],
        };
        for time in times.into_iter().flatten() {
            bytes.extend_from_slice(&time.to_le_bytes());
        }

        bytes
    }
}

impl InfoZipUnixExtraField {
    fn as_bytes(&self, variant: ExtraFieldVariant) -> Vec<u8> {
        match (variant, self.ids) {
            (ExtraFieldVariant::Local, Some((uid, gid))) => {
                let mut bytes = Vec::with_capacity(4);
                bytes.extend_from_slice(&uid.to_le_bytes());
                bytes.extend_from_slice(&gid.to_le_bytes());
                bytes
            }
            _ => Vec::new(),
        }
    }
}

/// Encodes extra fields into a chain, in the order given.
pub fn encode_chain(fields: &[ExtraField], variant: ExtraFieldVariant) -> ZipResult<Vec<u8>> {
    let mut buffer = Vec::new();

    for field in fields {
        let record = field.to_record(variant);
        let header = RawExtraFieldHeader {
            header_id: record.header_id.into(),
            data_size: record.data.len().try_into().map_err(|_| ZipError::ExtraFieldTooLarge)?,
        };

        buffer.extend_from_slice(&header.to_bytes());
        buffer.extend_from_slice(&record.data);
    }

    if buffer.len() > u16::MAX as usize {
        return Err(ZipError::ExtraFieldTooLarge);
    }

    Ok(buffer)
}
