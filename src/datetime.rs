/*
 *  datetime.rs
 *
 *  Tidey - fuzzy words watchface
 *  (c) 2020-26 Stuart Hunter
 *
 *  Date line - digital clock followed by day, date and month
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
use chrono::NaiveDateTime;
use core::fmt::Write;
use serde::{Deserialize, Serialize};

use crate::bounded::set_truncated;
use crate::fuzzy::PHRASE_CAPACITY;

pub type DateLine = ArrayString<PHRASE_CAPACITY>;

/// Device time display preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockStyle {
    #[default]
    #[serde(rename = "24h")]
    TwentyFour,
    #[serde(rename = "12h")]
    Twelve,
}

impl ClockStyle {
    fn pattern(self) -> &'static str {
        match self {
            ClockStyle::TwentyFour => "%H:%M",
            ClockStyle::Twelve => "%-I:%M",
        }
    }
}

/// "10:42 Fri 16 Oct" - day of month is space padded like strftime's %e.
pub fn format_date_line(now: &NaiveDateTime, clock: ClockStyle) -> DateLine {
    let text = format!("{} {}", clock_string(now, clock), now.format("%a %e %b"));
    let mut line = DateLine::new();
    if !set_truncated(&mut line, &text) {
        log::warn!("date line truncated: {}", text);
    }
    line
}

/// Clock part only, as the watch's own time string.
pub fn clock_string(now: &NaiveDateTime, clock: ClockStyle) -> ArrayString<8> {
    let mut out = ArrayString::new();
    // "12:59" is the longest either style produces
    let _ = write!(out, "{}", now.format(clock.pattern()));
    out
}
