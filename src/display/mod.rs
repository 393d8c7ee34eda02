/*
 *  display/mod.rs
 *
 *  Tidey - fuzzy words watchface
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display subsystem - layers, layout and the framebuffer
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

pub mod error;
pub mod framebuffer;
pub mod layer;
pub mod layout;

// Re-exports for convenience
pub use error::DisplayError;
pub use framebuffer::FrameBuffer;
pub use layer::{LayerText, TextLayer};
pub use layout::{WatchLayout, SCREEN_HEIGHT, SCREEN_WIDTH};
