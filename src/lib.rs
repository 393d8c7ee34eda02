/*
 *  lib.rs
 *
 *  Tidey - fuzzy words watchface
 *  (c) 2020-26 Stuart Hunter
 *
 *  Time in words, the date and the weather on a small monochrome screen
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

pub mod bounded;
pub mod companion;
pub mod config;
pub mod datetime;
pub mod display;
pub mod fuzzy;
pub mod geoloc;
pub mod message;
pub mod tick;
pub mod watchface;
pub mod weather;

pub use fuzzy::{format_fuzzy_time, fuzzy_time, FuzzyTimeError, HourStyle};
pub use watchface::{DisplayContext, FaceSettings};
