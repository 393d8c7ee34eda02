/*
 *  bounded.rs
 *
 *  Tidey - fuzzy words watchface
 *  (c) 2020-26 Stuart Hunter
 *
 *  Fixed capacity text sinks that truncate instead of overrunning
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
use core::fmt;

/// Result of writing into a bounded buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundedWrite {
    /// Everything fit; number of bytes before the terminator.
    Written(usize),
    /// Output was cut short. `needed` is the length the full text would have had.
    Truncated { written: usize, needed: usize },
}

impl BoundedWrite {
    pub fn written(&self) -> usize {
        match *self {
            BoundedWrite::Written(n) => n,
            BoundedWrite::Truncated { written, .. } => written,
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, BoundedWrite::Truncated { .. })
    }
}

/// `fmt::Write` sink over a caller-owned byte buffer.
///
/// One byte is always reserved for the zero terminator, so a buffer of
/// length N holds at most N - 1 bytes of text. Once a write does not fit,
/// the writer stops copying but keeps counting, so the caller learns how
/// much room the whole text needed.
pub struct BoundedWriter<'a> {
    buf: &'a mut [u8],
    len: usize,
    needed: usize,
    truncated: bool,
}

impl<'a> BoundedWriter<'a> {
    /// Returns `None` for an empty buffer, which cannot hold the terminator.
    pub fn new(buf: &'a mut [u8]) -> Option<Self> {
        let first = buf.first_mut()?;
        *first = 0;
        Some(Self { buf, len: 0, needed: 0, truncated: false })
    }

    /// Bytes of text the buffer can hold (terminator excluded).
    pub fn capacity(&self) -> usize {
        self.buf.len() - 1
    }

    /// Terminate the text and report what happened.
    pub fn finish(self) -> BoundedWrite {
        self.buf[self.len] = 0;
        if self.truncated {
            BoundedWrite::Truncated { written: self.len, needed: self.needed }
        } else {
            BoundedWrite::Written(self.len)
        }
    }
}

impl fmt::Write for BoundedWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.needed += s.len();
        if self.truncated {
            return Ok(());
        }
        let room = self.capacity() - self.len;
        let take = if s.len() <= room {
            s.len()
        } else {
            self.truncated = true;
            floor_char_boundary(s, room)
        };
        self.buf[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        Ok(())
    }
}

/// Replace the contents of `dst` with as much of `src` as fits.
/// Returns false when `src` had to be cut.
pub fn set_truncated<const N: usize>(dst: &mut ArrayString<N>, src: &str) -> bool {
    dst.clear();
    let take = floor_char_boundary(src, N);
    dst.push_str(&src[..take]);
    take == src.len()
}

/// Largest index <= `max` that does not split a UTF-8 sequence.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;

    #[test]
    fn fits_exactly_with_terminator() {
        let mut buf = [0xAAu8; 6];
        let mut w = BoundedWriter::new(&mut buf).unwrap();
        write!(w, "hello").unwrap();
        assert_eq!(w.finish(), BoundedWrite::Written(5));
        assert_eq!(&buf, b"hello\0");
    }

    #[test]
    fn truncates_and_keeps_counting() {
        let mut buf = [0xAAu8; 4];
        let mut w = BoundedWriter::new(&mut buf).unwrap();
        write!(w, "half").unwrap();
        write!(w, " past").unwrap();
        assert_eq!(w.finish(), BoundedWrite::Truncated { written: 3, needed: 9 });
        assert_eq!(&buf, b"hal\0");
    }

    #[test]
    fn later_short_writes_do_not_fill_gaps() {
        let mut buf = [0u8; 5];
        let mut w = BoundedWriter::new(&mut buf).unwrap();
        w.write_str("abcdef").unwrap();
        w.write_str("x").unwrap();
        let res = w.finish();
        assert_eq!(res.written(), 4);
        assert_eq!(&buf, b"abcd\0");
    }

    #[test]
    fn single_byte_buffer_is_terminator_only() {
        let mut buf = [b'z'; 1];
        let mut w = BoundedWriter::new(&mut buf).unwrap();
        assert_eq!(w.capacity(), 0);
        w.write_str("ten").unwrap();
        assert_eq!(w.finish(), BoundedWrite::Truncated { written: 0, needed: 3 });
        assert_eq!(buf, [0]);
    }

    #[test]
    fn empty_buffer_is_rejected() {
        let mut buf: [u8; 0] = [];
        assert!(BoundedWriter::new(&mut buf).is_none());
    }

    #[test]
    fn never_splits_multibyte_chars() {
        let mut buf = [0u8; 3];
        let mut w = BoundedWriter::new(&mut buf).unwrap();
        w.write_str("7°C").unwrap(); // '°' is two bytes
        let res = w.finish();
        assert!(res.is_truncated());
        assert_eq!(res.written(), 1);
        assert_eq!(&buf[..2], b"7\0");
    }

    #[test]
    fn array_string_truncation() {
        let mut s = ArrayString::<4>::new();
        assert!(set_truncated(&mut s, "abc"));
        assert_eq!(s.as_str(), "abc");
        assert!(!set_truncated(&mut s, "quarter"));
        assert_eq!(s.as_str(), "quar");
        assert!(!set_truncated(&mut s, "12°C"));
        assert_eq!(s.as_str(), "12°");
        assert!(!set_truncated(&mut s, "abc°"));
        assert_eq!(s.as_str(), "abc");
    }
}
