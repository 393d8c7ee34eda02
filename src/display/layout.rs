/*
 *  display/layout.rs
 *
 *  Tidey - fuzzy words watchface
 *  (c) 2020-26 Stuart Hunter
 *
 *  Watch layout - weather strip on top, words in the middle, date below
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

use embedded_graphics::mono_font::iso_8859_1::{FONT_10X20, FONT_7X13_BOLD};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_text::alignment::HorizontalAlignment;

use super::error::DisplayError;
use super::layer::TextLayer;

/// 144x168 watch screen
pub const SCREEN_WIDTH: u32 = 144;
pub const SCREEN_HEIGHT: u32 = 168;

const TOP_Y: u32 = 20;
const BOTTOM_Y: u32 = 21;

/// Frames for the three layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchLayout {
    pub weather: Rectangle,
    pub time: Rectangle,
    pub date: Rectangle,
}

impl WatchLayout {
    /// Weather strip is one pixel shy of the time layer so they never touch.
    pub fn for_frame(width: u32, height: u32) -> Result<Self, DisplayError> {
        if width == 0 || height <= TOP_Y + BOTTOM_Y {
            return Err(DisplayError::ScreenTooSmall { width, height });
        }
        Ok(Self {
            weather: Rectangle::new(Point::zero(), Size::new(width, TOP_Y - 1)),
            time: Rectangle::new(
                Point::new(0, TOP_Y as i32),
                Size::new(width, height - BOTTOM_Y - TOP_Y),
            ),
            date: Rectangle::new(
                Point::new(0, (height - BOTTOM_Y) as i32),
                Size::new(width, BOTTOM_Y),
            ),
        })
    }

    pub fn weather_layer(&self) -> TextLayer {
        TextLayer::new("weather", self.weather, &FONT_7X13_BOLD).align(HorizontalAlignment::Center)
    }

    pub fn time_layer(&self) -> TextLayer {
        TextLayer::new("time", self.time, &FONT_10X20).align(HorizontalAlignment::Left)
    }

    pub fn date_layer(&self) -> TextLayer {
        TextLayer::new("date", self.date, &FONT_7X13_BOLD).align(HorizontalAlignment::Center)
    }
}
