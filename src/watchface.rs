/*
 *  watchface.rs
 *
 *  Tidey - fuzzy words watchface
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display context and the tick / inbox handlers that drive it
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
use chrono::{NaiveDateTime, TimeDelta, Timelike};
use core::fmt::Write;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use log::{debug, info, warn};

use crate::bounded::set_truncated;
use crate::datetime::{format_date_line, ClockStyle};
use crate::display::{DisplayError, LayerText, TextLayer, WatchLayout};
use crate::fuzzy::{format_fuzzy_time, FuzzyTimeError, HourStyle, TimeOfDay, PHRASE_CAPACITY};
use crate::message::{Dictionary, MessageKey, Tuple, TupleValue};

/// Settings the face is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceSettings {
    pub hour_style: HourStyle,
    pub clock: ClockStyle,
    /// Ask the phone for weather every this many minutes of the day.
    pub refresh_mins: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for FaceSettings {
    fn default() -> Self {
        Self {
            hour_style: HourStyle::OClock,
            clock: ClockStyle::TwentyFour,
            refresh_mins: 30,
            width: crate::display::SCREEN_WIDTH,
            height: crate::display::SCREEN_HEIGHT,
        }
    }
}

/// Latest weather the phone told us about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeatherSummary {
    pub temperature: Option<ArrayString<16>>,
    pub location: Option<LayerText>,
    pub description: Option<LayerText>,
    /// Seconds between the phone's "now" and the forecast slot.
    pub forecast_offset_secs: Option<i32>,
}

impl WeatherSummary {
    /// "13°C clear sky"; the location stands in when there is no description.
    pub fn line(&self) -> LayerText {
        let mut line = LayerText::new();
        let detail = self.description.as_ref().or(self.location.as_ref());
        let text = match (&self.temperature, detail) {
            (Some(t), Some(d)) => format!("{} {}", t, d),
            (Some(t), None) => t.to_string(),
            (None, Some(d)) => d.to_string(),
            (None, None) => String::new(),
        };
        set_truncated(&mut line, &text);
        line
    }

    /// When the reported forecast applies, given when it was received.
    pub fn forecast_at(&self, received: NaiveDateTime) -> Option<NaiveDateTime> {
        self.forecast_offset_secs
            .map(|s| received + TimeDelta::seconds(s as i64))
    }
}

fn tuple_text<const N: usize>(value: &TupleValue) -> ArrayString<N> {
    let mut out = ArrayString::new();
    set_truncated(&mut out, &value.to_string());
    out
}

/// Everything on screen. Built once at startup and handed to the handlers.
#[derive(Debug)]
pub struct DisplayContext {
    pub weather: TextLayer,
    pub time: TextLayer,
    pub date: TextLayer,
    summary: WeatherSummary,
    settings: FaceSettings,
    ticked: bool,
}

impl DisplayContext {
    pub fn new(settings: FaceSettings) -> Result<Self, DisplayError> {
        if settings.refresh_mins == 0 {
            return Err(DisplayError::InvalidConfiguration("refresh_mins must be > 0".into()));
        }
        let layout = WatchLayout::for_frame(settings.width, settings.height)?;
        info!(
            "Watchface {}x{} hour style {:?} clock {:?}",
            settings.width, settings.height, settings.hour_style, settings.clock
        );
        Ok(Self {
            weather: layout.weather_layer(),
            time: layout.time_layer(),
            date: layout.date_layer(),
            summary: WeatherSummary::default(),
            settings,
            ticked: false,
        })
    }

    pub fn settings(&self) -> &FaceSettings {
        &self.settings
    }

    pub fn weather_summary(&self) -> &WeatherSummary {
        &self.summary
    }

    /// Words for the time into the time layer.
    pub fn update_time(&mut self, time: TimeOfDay) {
        let mut buf = [0u8; PHRASE_CAPACITY];
        let written = match format_fuzzy_time(
            time.hour() as u32,
            time.minute() as u32,
            &mut buf,
            self.settings.hour_style,
        ) {
            Ok(n) => n,
            Err(FuzzyTimeError::BufferTooSmall { written, needed, .. }) => {
                warn!("time phrase cut to {} of {} bytes", written, needed);
                written
            }
            Err(e) => {
                warn!("time not updated: {}", e);
                return;
            }
        };
        // the formatter only emits ASCII
        let phrase = std::str::from_utf8(&buf[..written]).unwrap_or_default();
        self.time.set_text(phrase);
    }

    pub fn update_date(&mut self, now: &NaiveDateTime) {
        let line = format_date_line(now, self.settings.clock);
        self.date.set_text(&line);
    }

    /// True when this minute of the day is on the refresh grid.
    pub fn refresh_due(&self, now: &NaiveDateTime) -> bool {
        let minute_of_day = now.hour() * 60 + now.minute();
        minute_of_day % self.settings.refresh_mins == 0
    }

    /// Minute tick: refresh time and date, and maybe ask the phone for weather.
    /// The very first tick always asks.
    pub fn handle_minute_tick(&mut self, now: &NaiveDateTime) -> Option<Dictionary> {
        self.update_time(TimeOfDay::from_time(now));
        self.update_date(now);
        debug!("tick {} -> \"{}\" / \"{}\"", now.format("%H:%M"), self.time.text(), self.date.text());

        let first = !self.ticked;
        self.ticked = true;
        (first || self.refresh_due(now)).then(Dictionary::refresh_request)
    }

    pub fn process_tuple(&mut self, tuple: &Tuple) {
        match tuple.message_key() {
            Some(MessageKey::Temperature) => {
                let mut temp = ArrayString::<16>::new();
                match &tuple.value {
                    TupleValue::Int(c) => {
                        let _ = write!(temp, "{}°C", c);
                    }
                    other => {
                        set_truncated(&mut temp, &other.to_string());
                    }
                }
                self.summary.temperature = Some(temp);
            }
            Some(MessageKey::Location) => {
                self.summary.location = Some(tuple_text(&tuple.value));
            }
            Some(MessageKey::WeatherDescription) => {
                self.summary.description = Some(tuple_text(&tuple.value));
            }
            Some(MessageKey::UnixTimestamp) => {
                self.summary.forecast_offset_secs = tuple.as_int();
            }
            Some(MessageKey::RefreshRequest) | None => {
                debug!("ignoring tuple key {}", tuple.key);
            }
        }
    }

    /// Inbox handler: apply every tuple, then redo the weather line.
    /// Returns true when the weather line changed.
    pub fn in_received(&mut self, dict: &Dictionary) -> bool {
        // a reply naming a place but no conditions replaces the old conditions
        if dict.get(MessageKey::Location).is_some() && dict.get(MessageKey::WeatherDescription).is_none() {
            self.summary.description = None;
        }
        for tuple in dict.iter() {
            self.process_tuple(tuple);
        }
        let line = self.summary.line();
        if line.as_str() == self.weather.text() {
            return false;
        }
        info!("weather: {}", line);
        self.weather.set_text(&line);
        true
    }

    pub fn render<D>(&self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        target.clear(BinaryColor::Off)?;
        self.weather.render(target)?;
        self.time.render(target)?;
        self.date.render(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hh: u32, mm: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap().and_hms_opt(hh, mm, 0).unwrap()
    }

    fn face() -> DisplayContext {
        DisplayContext::new(FaceSettings::default()).unwrap()
    }

    #[test]
    fn tick_updates_time_and_date() {
        let mut ctx = face();
        ctx.handle_minute_tick(&at(22, 44));
        assert_eq!(ctx.time.text(), "quarter to eleven");
        assert_eq!(ctx.date.text(), "22:44 Fri 16 Oct");
    }

    #[test]
    fn refresh_requests_follow_the_grid() {
        let mut ctx = face();
        assert_eq!(ctx.handle_minute_tick(&at(9, 7)), Some(Dictionary::refresh_request()));
        assert_eq!(ctx.handle_minute_tick(&at(9, 8)), None);
        assert_eq!(ctx.handle_minute_tick(&at(9, 30)), Some(Dictionary::refresh_request()));
        assert_eq!(ctx.handle_minute_tick(&at(10, 0)), Some(Dictionary::refresh_request()));
    }

    #[test]
    fn every_minute_refresh() {
        let mut ctx = DisplayContext::new(FaceSettings { refresh_mins: 1, ..Default::default() }).unwrap();
        ctx.handle_minute_tick(&at(9, 7));
        assert!(ctx.handle_minute_tick(&at(9, 8)).is_some());
    }

    #[test]
    fn named_style_reaches_the_screen() {
        let mut ctx = DisplayContext::new(FaceSettings {
            hour_style: HourStyle::Named,
            ..Default::default()
        })
        .unwrap();
        ctx.handle_minute_tick(&at(23, 58));
        assert_eq!(ctx.time.text(), "midnight");
    }

    #[test]
    fn weather_dictionary_builds_line() {
        let mut ctx = face();
        let dict: Dictionary = [
            Tuple::int(MessageKey::Temperature, 13),
            Tuple::cstring(MessageKey::Location, "Leeds"),
            Tuple::cstring(MessageKey::WeatherDescription, "clear sky"),
            Tuple::int(MessageKey::UnixTimestamp, 5400),
        ]
        .into_iter()
        .collect();
        assert!(ctx.in_received(&dict));
        assert_eq!(ctx.weather.text(), "13°C clear sky");
        assert_eq!(ctx.weather_summary().location.as_deref(), Some("Leeds"));
        assert_eq!(ctx.weather_summary().forecast_at(at(12, 0)), Some(at(13, 30)));

        // same data again changes nothing
        assert!(!ctx.in_received(&dict));
    }

    #[test]
    fn partial_updates_keep_earlier_values() {
        let mut ctx = face();
        ctx.in_received(&[Tuple::int(MessageKey::Temperature, -3)].into_iter().collect());
        assert_eq!(ctx.weather.text(), "-3°C");
        ctx.in_received(&[Tuple::cstring(MessageKey::WeatherDescription, "snow")].into_iter().collect());
        assert_eq!(ctx.weather.text(), "-3°C snow");
    }

    #[test]
    fn location_unavailable_is_shown() {
        let mut ctx = face();
        ctx.in_received(&crate::weather::location_unavailable());
        assert_eq!(ctx.weather.text(), "N/A Loc Unavailable");
    }

    #[test]
    fn lost_location_after_good_weather() {
        let mut ctx = face();
        let good = crate::weather::WeatherReport {
            temperature_c: 13,
            location: "Leeds".to_string(),
            description: "clear sky".to_string(),
            forecast_offset_secs: 0,
        };
        ctx.in_received(&good.to_dictionary());
        assert_eq!(ctx.weather.text(), "13°C clear sky");

        assert!(ctx.in_received(&crate::weather::location_unavailable()));
        assert_eq!(ctx.weather.text(), "N/A Loc Unavailable");

        ctx.in_received(&good.to_dictionary());
        assert_eq!(ctx.weather.text(), "13°C clear sky");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let mut ctx = face();
        let dict: Dictionary = [Tuple { key: 42, value: TupleValue::Int(1) }].into_iter().collect();
        assert!(!ctx.in_received(&dict));
        assert_eq!(ctx.weather_summary(), &WeatherSummary::default());
    }

    #[test]
    fn zero_refresh_interval_is_rejected() {
        let res = DisplayContext::new(FaceSettings { refresh_mins: 0, ..Default::default() });
        assert!(matches!(res, Err(DisplayError::InvalidConfiguration(_))));
    }
}
