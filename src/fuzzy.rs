/*
 *  fuzzy.rs
 *
 *  Tidey - fuzzy words watchface
 *  (c) 2020-26 Stuart Hunter
 *
 *  Time in words - "quarter past ten", "twenty five to eleven"
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use arrayvec::ArrayString;
use chrono::Timelike;
use core::fmt::{self, Write};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bounded::{BoundedWrite, BoundedWriter};

/// Size of the text buffers on the watch, terminator included.
pub const PHRASE_CAPACITY: usize = 86;

/// Longest phrase the formatter produces ("twenty five past midnight").
pub const MAX_PHRASE_LEN: usize = 25;

/// Stack allocated phrase
pub type Phrase = ArrayString<PHRASE_CAPACITY>;

// index: hour % 12
const HOUR_WORDS: [&str; 12] = [
    "twelve", "one", "two", "three", "four", "five",
    "six", "seven", "eight", "nine", "ten", "eleven",
];

// index: minutes / 5, for 5..=25
const MINUTE_WORDS: [&str; 6] = ["", "five", "ten", "quarter", "twenty", "twenty five"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FuzzyTimeError {
    #[error("hour {0} out of range 0..=23")]
    InvalidHour(u32),
    #[error("minute {0} out of range 0..=59")]
    InvalidMinute(u32),
    #[error("buffer too small: capacity {capacity}, wrote {written} of {needed} characters")]
    BufferTooSmall { capacity: usize, written: usize, needed: usize },
}

/// How hours 0 and 12 are spoken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HourStyle {
    /// "twelve o'clock", "five to twelve"
    #[default]
    #[value(name = "oclock")]
    OClock,
    /// "midnight", "noon", "five to midnight"
    Named,
}

/// Wall clock hour and minute, validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Result<Self, FuzzyTimeError> {
        if hour > 23 {
            return Err(FuzzyTimeError::InvalidHour(hour));
        }
        if minute > 59 {
            return Err(FuzzyTimeError::InvalidMinute(minute));
        }
        Ok(Self { hour: hour as u8, minute: minute as u8 })
    }

    /// chrono guarantees the ranges; leap seconds do not touch hour/minute.
    pub fn from_time<T: Timelike>(t: &T) -> Self {
        Self { hour: t.hour() as u8, minute: t.minute() as u8 }
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn bucket(&self) -> MinuteBucket {
        MinuteBucket::from_minute(self.minute)
    }
}

/// Minute rounded to the five minute grid, 0..=60.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MinuteBucket(u8);

impl MinuteBucket {
    /// Round half up: xx:x2 goes down, xx:x3 goes up.
    /// Only reached through a validated `TimeOfDay`, so `minute` is 0..=59.
    pub(crate) fn from_minute(minute: u8) -> Self {
        debug_assert!(minute < 60, "minute {minute} out of range");
        Self((minute + 2) / 5 * 5)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// True when rounding carried into the next hour.
    pub fn rolls_over(self) -> bool {
        self.0 == 60
    }
}

/// A time already rounded to its bucket, ready to be spoken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuzzyTime {
    hour: u8,   // 0..=23, after any carry
    bucket: u8, // 0..=55
    style: HourStyle,
}

impl FuzzyTime {
    pub fn new(time: TimeOfDay, style: HourStyle) -> Self {
        let bucket = time.bucket();
        let (hour, bucket) = if bucket.rolls_over() {
            ((time.hour + 1) % 24, 0)
        } else {
            (time.hour, bucket.value())
        };
        Self { hour, bucket, style }
    }

    /// Effective hour (0..=23) after rounding.
    pub fn hour(&self) -> u8 {
        self.hour
    }

    /// Effective minute bucket (0..=55) after rounding.
    pub fn bucket(&self) -> u8 {
        self.bucket
    }

    /// The phrase as a stack string.
    pub fn phrase(&self) -> Phrase {
        let mut out = Phrase::new();
        // MAX_PHRASE_LEN < PHRASE_CAPACITY, cannot overflow
        let _ = write!(out, "{self}");
        out
    }

    fn hour_word(&self, hour: u8) -> &'static str {
        match (self.style, hour) {
            (HourStyle::Named, 0) => "midnight",
            (HourStyle::Named, 12) => "noon",
            _ => HOUR_WORDS[(hour % 12) as usize],
        }
    }
}

impl fmt::Display for FuzzyTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let next_hour = (self.hour + 1) % 24;
        match self.bucket {
            0 => match (self.style, self.hour) {
                (HourStyle::Named, 0 | 12) => f.write_str(self.hour_word(self.hour)),
                _ => write!(f, "{} o'clock", HOUR_WORDS[(self.hour % 12) as usize]),
            },
            30 => write!(f, "half past {}", self.hour_word(self.hour)),
            b if b < 30 => write!(f, "{} past {}", MINUTE_WORDS[(b / 5) as usize], self.hour_word(self.hour)),
            b => write!(f, "{} to {}", MINUTE_WORDS[((60 - b) / 5) as usize], self.hour_word(next_hour)),
        }
    }
}

/// Write the phrase for `hour:minute` into `buf`, zero terminated.
///
/// The capacity is `buf.len()`, terminator included. On success the
/// number of bytes before the terminator is returned. When the phrase does
/// not fit, as much as fits is written and terminated, and
/// `BufferTooSmall` reports both what was written and what was needed.
/// Nothing outside `buf` is ever touched; an empty `buf` is left alone.
pub fn format_fuzzy_time(
    hour: u32,
    minute: u32,
    buf: &mut [u8],
    style: HourStyle,
) -> Result<usize, FuzzyTimeError> {
    let fuzzy = FuzzyTime::new(TimeOfDay::new(hour, minute)?, style);
    let capacity = buf.len();

    let Some(mut writer) = BoundedWriter::new(buf) else {
        return Err(FuzzyTimeError::BufferTooSmall {
            capacity,
            written: 0,
            needed: fuzzy.phrase().len(),
        });
    };
    // the writer never fails, it records truncation instead
    let _ = write!(writer, "{fuzzy}");

    match writer.finish() {
        BoundedWrite::Written(n) => Ok(n),
        BoundedWrite::Truncated { written, needed } => {
            Err(FuzzyTimeError::BufferTooSmall { capacity, written, needed })
        }
    }
}

/// Convenience form returning an owned stack phrase.
pub fn fuzzy_time(hour: u32, minute: u32, style: HourStyle) -> Result<Phrase, FuzzyTimeError> {
    Ok(FuzzyTime::new(TimeOfDay::new(hour, minute)?, style).phrase())
}
