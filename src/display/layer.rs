/*
 *  display/layer.rs
 *
 *  Tidey - fuzzy words watchface
 *  (c) 2020-26 Stuart Hunter
 *
 *  Text layer - a framed region of the screen holding one bounded string
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
use embedded_graphics::mono_font::{MonoFont, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_text::alignment::{HorizontalAlignment, VerticalAlignment};
use embedded_text::{style::TextBoxStyleBuilder, TextBox};
use log::warn;

use crate::bounded::set_truncated;
use crate::fuzzy::PHRASE_CAPACITY;

pub type LayerText = ArrayString<PHRASE_CAPACITY>;

/// A text region with its own font, colours and alignment.
#[derive(Debug, Clone)]
pub struct TextLayer {
    /// Layer identifier for logging ("time", "date", "weather")
    pub name: &'static str,

    /// Frame on screen
    pub bounds: Rectangle,

    pub font: &'static MonoFont<'static>,

    pub text_color: BinaryColor,

    pub background: BinaryColor,

    pub alignment: HorizontalAlignment,

    text: LayerText,
}

impl TextLayer {
    /// White on black, left aligned, empty.
    pub fn new(name: &'static str, bounds: Rectangle, font: &'static MonoFont<'static>) -> Self {
        Self {
            name,
            bounds,
            font,
            text_color: BinaryColor::On,
            background: BinaryColor::Off,
            alignment: HorizontalAlignment::Left,
            text: LayerText::new(),
        }
    }

    /// Builder: set alignment
    pub fn align(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Builder: set colors
    pub fn colors(mut self, text_color: BinaryColor, background: BinaryColor) -> Self {
        self.text_color = text_color;
        self.background = background;
        self
    }

    /// Replace the text. Returns false when it had to be truncated.
    pub fn set_text(&mut self, text: &str) -> bool {
        let fit = set_truncated(&mut self.text, text);
        if !fit {
            warn!("{} layer text truncated to {} bytes", self.name, self.text.len());
        }
        fit
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Fill the frame with the background, then draw the wrapped text.
    pub fn render<D>(&self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        self.bounds
            .into_styled(PrimitiveStyle::with_fill(self.background))
            .draw(target)?;

        if self.text.is_empty() {
            return Ok(());
        }

        let character_style = MonoTextStyleBuilder::new()
            .font(self.font)
            .text_color(self.text_color)
            .build();
        let textbox_style = TextBoxStyleBuilder::new()
            .alignment(self.alignment)
            .vertical_alignment(VerticalAlignment::Top)
            .build();

        TextBox::with_textbox_style(&self.text, self.bounds, character_style, textbox_style)
            .draw(target)
            .map(|_| ()) // TextBox::draw returns the text that did not fit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::framebuffer::FrameBuffer;
    use embedded_graphics::mono_font::ascii::FONT_6X10;

    fn layer() -> TextLayer {
        TextLayer::new("test", Rectangle::new(Point::new(0, 10), Size::new(60, 20)), &FONT_6X10)
    }

    #[test]
    fn empty_layer_draws_background_only() {
        let mut fb = FrameBuffer::new(64, 40).unwrap();
        layer().render(&mut fb).unwrap();
        assert_eq!(fb.lit_in(&Rectangle::new(Point::zero(), Size::new(64, 40))), 0);
    }

    #[test]
    fn text_stays_inside_its_frame() {
        let mut fb = FrameBuffer::new(64, 40).unwrap();
        let mut l = layer();
        assert!(l.set_text("ten past two"));
        l.render(&mut fb).unwrap();
        let inside = fb.lit_in(&l.bounds);
        let everywhere = fb.lit_in(&Rectangle::new(Point::zero(), Size::new(64, 40)));
        assert!(inside > 0);
        assert_eq!(inside, everywhere);
    }

    #[test]
    fn inverted_colors_fill_frame() {
        let mut fb = FrameBuffer::new(64, 40).unwrap();
        let l = layer().colors(BinaryColor::Off, BinaryColor::On);
        l.render(&mut fb).unwrap();
        assert_eq!(fb.lit_in(&l.bounds), 60 * 20);
    }

    #[test]
    fn overlong_text_is_truncated() {
        let mut l = layer();
        let long = "x".repeat(PHRASE_CAPACITY + 10);
        assert!(!l.set_text(&long));
        assert_eq!(l.text().len(), PHRASE_CAPACITY);
    }
}
