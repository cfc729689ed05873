// Copyright (c) 2024 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

use crate::date::{DAY, HALF_SECOND, HOUR, MINUTE, MIN_YEAR, MONTH, YEAR};
use crate::ZipDateTime;

/// A builder for [`ZipDateTime`].
///
/// Each setter masks its value into the width of its field, so out-of-range components wrap rather than spill into
/// their neighbours.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZipDateTimeBuilder(pub(crate) ZipDateTime);

impl From<ZipDateTime> for ZipDateTimeBuilder {
    fn from(date: ZipDateTime) -> Self {
        Self(date)
    }
}

impl ZipDateTimeBuilder {
    /// Constructs a new builder with every field zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the year. Years before 1980 cannot be represented and are stored as 1980.
    pub fn year(mut self, year: i32) -> Self {
        self.0.date = YEAR.set(self.0.date, (year.max(MIN_YEAR) - MIN_YEAR) as u32);
        self
    }

    pub fn month(mut self, month: u32) -> Self {
        self.0.date = MONTH.set(self.0.date, month);
        self
    }

    pub fn day(mut self, day: u32) -> Self {
        self.0.date = DAY.set(self.0.date, day);
        self
    }

    pub fn hour(mut self, hour: u32) -> Self {
        self.0.time = HOUR.set(self.0.time, hour);
        self
    }

    pub fn minute(mut self, minute: u32) -> Self {
        self.0.time = MINUTE.set(self.0.time, minute);
        self
    }

    /// Sets the second, rounded down to a multiple of two.
    pub fn second(mut self, second: u32) -> Self {
        self.0.time = HALF_SECOND.set(self.0.time, second / 2);
        self
    }

    /// Consumes this builder and returns a final [`ZipDateTime`].
    ///
    /// This is equivalent to:
    /// ```
    /// # use sync_zip::{ZipDateTime, ZipDateTimeBuilder};
    /// #
    /// # let builder = ZipDateTimeBuilder::new().year(2024).month(3).day(2);
    /// let date: ZipDateTime = builder.into();
    /// ```
    pub fn build(self) -> ZipDateTime {
        self.into()
    }
}
