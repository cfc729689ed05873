// Copyright (c) 2024 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

//! A generic codec for fixed-layout binary records.
//!
//! Every field of a record has a width and an endianness which are fixed by its type, so decoding and encoding
//! are total over a buffer of the record's length. Records are declared with the [`raw!`] macro, which generates
//! the struct alongside its [`Codec`] and [`Record`] implementations. A record may be used as a field of another
//! record, in which case it is decoded as a single step at its position in the field list.
//!
//! Supported field types:
//! - `u8`, and `u16`/`u32`/`u64`/`i32` stored little-endian
//! - [`Be<T>`] for the same integers stored big-endian
//! - `[u8; N]` fixed-size byte arrays, preserved verbatim
//! - [`Reserved<N>`] padding, skipped on decode and zeroed on encode
//! - any other type declared with [`raw!`]

use std::io::{Read, Write};

use crate::error::{Result, ZipError};

/// A value with a fixed on-disk width and byte order.
pub trait Codec: Sized {
    /// The number of bytes this value occupies.
    const WIDTH: usize;

    /// Decodes the value from the start of `buf`, which must hold at least [`Codec::WIDTH`] bytes.
    fn decode(buf: &[u8]) -> Self;

    /// Encodes the value into the start of `buf`, which must hold at least [`Codec::WIDTH`] bytes.
    fn encode(&self, buf: &mut [u8]);
}

/// A top-level record which can be checked against untrusted buffers and streams.
pub trait Record: Codec {
    /// The total length in bytes of this record.
    const LENGTH: usize = <Self as Codec>::WIDTH;

    /// Decodes the record from a buffer holding at least [`Record::LENGTH`] bytes.
    ///
    /// A shorter buffer is a hard failure; the record is never partially decoded.
    fn decode_from(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::LENGTH {
            return Err(ZipError::TruncatedHeader { expected: Self::LENGTH, actual: buf.len() });
        }

        Ok(<Self as Codec>::decode(&buf[..Self::LENGTH]))
    }

    /// Encodes the record into a buffer holding at least [`Record::LENGTH`] bytes.
    fn encode_into(&self, buf: &mut [u8]) -> Result<()> {
        if buf.len() < Self::LENGTH {
            return Err(ZipError::TruncatedHeader { expected: Self::LENGTH, actual: buf.len() });
        }

        <Self as Codec>::encode(self, &mut buf[..Self::LENGTH]);
        Ok(())
    }

    /// Encodes the record into a newly allocated buffer.
    fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = vec![0; Self::LENGTH];
        <Self as Codec>::encode(self, &mut buffer);
        buffer
    }

    /// Reads and decodes the record from the given reader.
    #[tracing::instrument(skip(reader))]
    fn read_from<R: Read>(reader: R) -> Result<Self> {
        let mut buffer = Vec::with_capacity(Self::LENGTH);
        reader.take(Self::LENGTH as u64).read_to_end(&mut buffer)?;
        Self::decode_from(&buffer)
    }

    /// Encodes and writes the record to the given writer.
    #[tracing::instrument(skip(self, writer))]
    fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }
}

/// An integer stored with big endianness.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Be<T>(pub T);

/// Padding which occupies `N` bytes but carries no value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Reserved<const N: usize>;

impl Codec for u8 {
    const WIDTH: usize = 1;

    fn decode(buf: &[u8]) -> Self {
        buf[0]
    }

    fn encode(&self, buf: &mut [u8]) {
        buf[0] = *self;
    }
}

macro_rules! integer_codec {
    ($($type:ty),*) => {
        $(
            impl Codec for $type {
                const WIDTH: usize = std::mem::size_of::<$type>();

                fn decode(buf: &[u8]) -> Self {
                    let mut bytes = [0; std::mem::size_of::<$type>()];
                    bytes.copy_from_slice(&buf[..Self::WIDTH]);
                    <$type>::from_le_bytes(bytes)
                }

                fn encode(&self, buf: &mut [u8]) {
                    buf[..Self::WIDTH].copy_from_slice(&self.to_le_bytes());
                }
            }

            impl Codec for Be<$type> {
                const WIDTH: usize = std::mem::size_of::<$type>();

                fn decode(buf: &[u8]) -> Self {
                    let mut bytes = [0; std::mem::size_of::<$type>()];
                    bytes.copy_from_slice(&buf[..Self::WIDTH]);
                    Be(<$type>::from_be_bytes(bytes))
                }

                fn encode(&self, buf: &mut [u8]) {
                    buf[..Self::WIDTH].copy_from_slice(&self.0.to_be_bytes());
                }
            }
        )*
    };
}

integer_codec!(u16, u32, u64, i32);

impl<const N: usize> Codec for [u8; N] {
    const WIDTH: usize = N;

    fn decode(buf: &[u8]) -> Self {
        let mut array = [0; N];
        array.copy_from_slice(&buf[..N]);
        array
    }

    fn encode(&self, buf: &mut [u8]) {
        buf[..N].copy_from_slice(self);
    }
}

impl<const N: usize> Codec for Reserved<N> {
    const WIDTH: usize = N;

    fn decode(_: &[u8]) -> Self {
        Reserved
    }

    fn encode(&self, buf: &mut [u8]) {
        buf[..N].fill(0);
    }
}

/// Declares a fixed-layout record.
///
/// Fields are laid out in declaration order with no implicit padding.
macro_rules! raw {
    ($(#[$meta:meta])* $name:ident { $($(#[$field_meta:meta])* $field:ident : $type:ty),* $(,)? }) => {
        $(#[$meta])*
        pub struct $name {
            $($(#[$field_meta])* pub $field: $type),*
        }

        impl $crate::spec::codec::Codec for $name {
            const WIDTH: usize = 0 $(+ <$type as $crate::spec::codec::Codec>::WIDTH)*;

            fn decode(buf: &[u8]) -> Self {
                let mut _offset = 0;
                $(
                    let $field = <$type as $crate::spec::codec::Codec>::decode(&buf[_offset..]);
                    _offset += <$type as $crate::spec::codec::Codec>::WIDTH;
                )*

                Self { $($field),* }
            }

            fn encode(&self, buf: &mut [u8]) {
                let mut _offset = 0;
                $(
                    <$type as $crate::spec::codec::Codec>::encode(&self.$field, &mut buf[_offset..]);
                    _offset += <$type as $crate::spec::codec::Codec>::WIDTH;
                )*
            }
        }

        impl $crate::spec::codec::Record for $name {}
    };
}

pub(crate) use raw;
