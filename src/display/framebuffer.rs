/*
 *  display/framebuffer.rs
 *
 *  Tidey - fuzzy words watchface
 *  (c) 2020-26 Stuart Hunter
 *
 *  Runtime sized monochrome framebuffer the watchface renders into
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

use core::convert::Infallible;
use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use super::error::DisplayError;

#[derive(Debug, Clone)]
pub struct FrameBuffer {
    buf: Vec<BinaryColor>,
    w: usize,
    h: usize,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Result<Self, DisplayError> {
        if width == 0 || height == 0 {
            return Err(DisplayError::InvalidConfiguration(format!(
                "framebuffer must not be empty ({}x{})",
                width, height
            )));
        }
        let (w, h) = (width as usize, height as usize);
        Ok(Self { buf: vec![BinaryColor::Off; w * h], w, h })
    }


    pub fn pixel(&self, x: u32, y: u32) -> Option<BinaryColor> {
        self.idx(Point::new(x as i32, y as i32)).map(|i| self.buf[i])
    }

    /// Number of lit pixels inside `area` (clipped to the buffer).
    pub fn lit_in(&self, area: &Rectangle) -> usize {
        area.points()
            .filter_map(|p| self.idx(p))
            .filter(|&i| self.buf[i] == BinaryColor::On)
            .count()
    }

    /// One line per row, '#' for lit pixels.
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity((self.w + 1) * self.h);
        for row in self.buf.chunks(self.w) {
            out.extend(row.iter().map(|c| if c.is_on() { '#' } else { '.' }));
            out.push('\n');
        }
        out
    }

    /// Map (x,y) to linear index; returns None if out of bounds
    #[inline]
    fn idx(&self, p: Point) -> Option<usize> {
        if p.x >= 0 && p.y >= 0 {
            let (x, y) = (p.x as usize, p.y as usize);
            if x < self.w && y < self.h {
                return Some(y * self.w + x);
            }
        }
        None
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.w as u32, self.h as u32)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            if let Some(i) = self.idx(p) {
                self.buf[i] = c;
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.buf.fill(color);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::PrimitiveStyle;

    #[test]
    fn rejects_empty_dimensions() {
        assert!(FrameBuffer::new(0, 10).is_err());
        assert!(FrameBuffer::new(10, 0).is_err());
    }

    #[test]
    fn clips_out_of_bounds_pixels() {
        let mut fb = FrameBuffer::new(4, 3).unwrap();
        Rectangle::new(Point::new(2, 1), Size::new(10, 10))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut fb)
            .unwrap();
        assert_eq!(fb.to_ascii(), "....\n..##\n..##\n");
        assert_eq!(fb.lit_in(&Rectangle::new(Point::zero(), Size::new(4, 3))), 4);
        assert_eq!(fb.pixel(3, 2), Some(BinaryColor::On));
        assert_eq!(fb.pixel(4, 0), None);
    }
}
