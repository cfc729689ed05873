// Copyright (c) 2021-2024 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

//! MS-DOS date and time values, as carried by local file headers and central directory records.
//!
//! <https://github.com/Majored/rs-async-zip/blob/main/SPECIFICATION.md#446>
//!
//! Each half is a packed `u16`. The date holds `year - 1980` (7 bits), the month (4 bits) and the day (5 bits); the
//! time holds the hour (5 bits), the minute (6 bits) and half the second (5 bits).

pub mod builder;

use chrono::{DateTime, Datelike, LocalResult, TimeZone, Timelike, Utc};

use self::builder::ZipDateTimeBuilder;
use crate::spec::codec::raw;

/// A bit field within one half of a [`ZipDateTime`].
#[derive(Clone, Copy)]
pub(crate) struct Field {
    pub(crate) mask: u16,
    pub(crate) shift: u16,
}

impl Field {
    const fn new(mask: u16, shift: u16) -> Self {
        Self { mask, shift }
    }

    pub(crate) fn get(self, packed: u16) -> u32 {
        ((packed & self.mask) >> self.shift).into()
    }

    pub(crate) fn set(self, packed: u16, value: u32) -> u16 {
        (packed & !self.mask) | (((value << self.shift) as u16) & self.mask)
    }
}

pub(crate) const YEAR: Field = Field::new(0xFE00, 9);
pub(crate) const MONTH: Field = Field::new(0x01E0, 5);
pub(crate) const DAY: Field = Field::new(0x001F, 0);
pub(crate) const HOUR: Field = Field::new(0xF800, 11);
pub(crate) const MINUTE: Field = Field::new(0x07E0, 5);
pub(crate) const HALF_SECOND: Field = Field::new(0x001F, 0);

pub(crate) const MIN_YEAR: i32 = 1980;
pub(crate) const MAX_YEAR: i32 = MIN_YEAR + 127;

raw! {
    /// A date and time stored as per the MS-DOS representation used by ZIP files.
    ///
    /// On disk the time precedes the date, and the pair is encoded as a single nested field of each header.
    #[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash)]
    ZipDateTime {
        time: u16,
        date: u16
    }
}

impl ZipDateTime {
    /// Returns the year of this date & time.
    pub fn year(&self) -> i32 {
        YEAR.get(self.date) as i32 + MIN_YEAR
    }

    /// Returns the month of this date & time.
    pub fn month(&self) -> u32 {
        MONTH.get(self.date)
    }

    /// Returns the day of this date & time.
    pub fn day(&self) -> u32 {
        DAY.get(self.date)
    }

    /// Returns the hour of this date & time.
    pub fn hour(&self) -> u32 {
        HOUR.get(self.time)
    }

    /// Returns the minute of this date & time.
    pub fn minute(&self) -> u32 {
        MINUTE.get(self.time)
    }

    /// Returns the second of this date & time.
    ///
    /// Note that MS-DOS has a maximum granularity of two seconds.
    pub fn second(&self) -> u32 {
        HALF_SECOND.get(self.time) * 2
    }

    /// Constructs chrono's [`DateTime`] representation of this date & time.
    ///
    /// Packed values which don't name a real date (such as the all-zero default) give [`LocalResult::None`].
    pub fn as_chrono(&self) -> LocalResult<DateTime<Utc>> {
        Utc.with_ymd_and_hms(self.year(), self.month(), self.day(), self.hour(), self.minute(), self.second())
    }

    /// Constructs this date & time from chrono's [`DateTime`] representation.
    ///
    /// Dates outside of the representable range (1980 to 2107) are clamped to its bounds, and odd seconds are
    /// rounded down.
    pub fn from_chrono(dt: &DateTime<Utc>) -> Self {
        let builder = match dt.year() {
            year if year < MIN_YEAR => ZipDateTimeBuilder::new().year(MIN_YEAR).month(1).day(1),
            year if year > MAX_YEAR => {
                ZipDateTimeBuilder::new().year(MAX_YEAR).month(12).day(31).hour(23).minute(59).second(58)
            }
            year => ZipDateTimeBuilder::new()
                .year(year)
                .month(dt.month())
                .day(dt.day())
                .hour(dt.hour())
                .minute(dt.minute())
                .second(dt.second()),
        };

        builder.build()
    }
}

impl From<ZipDateTimeBuilder> for ZipDateTime {
    fn from(builder: ZipDateTimeBuilder) -> Self {
        builder.0
    }
}

impl From<&DateTime<Utc>> for ZipDateTime {
    fn from(value: &DateTime<Utc>) -> Self {
        Self::from_chrono(value)
    }
}

impl From<DateTime<Utc>> for ZipDateTime {
    fn from(value: DateTime<Utc>) -> Self {
        Self::from_chrono(&value)
    }
}
