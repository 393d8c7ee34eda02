/*
 *  tests/fuzzy_time.rs
 *
 *  Tidey - fuzzy words watchface
 *  (c) 2020-26 Stuart Hunter
 *
 *  Whole-day properties of the fuzzy time formatter, through the public API
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

use tidey::fuzzy::{MAX_PHRASE_LEN, PHRASE_CAPACITY};
use tidey::{format_fuzzy_time, fuzzy_time, FuzzyTimeError, HourStyle};

const STYLES: [HourStyle; 2] = [HourStyle::OClock, HourStyle::Named];

fn every_minute() -> impl Iterator<Item = (u32, u32)> {
    (0..24).flat_map(|h| (0..60).map(move |m| (h, m)))
}

#[test]
fn whole_day_fits_and_is_terminated() {
    for style in STYLES {
        for (h, m) in every_minute() {
            let mut buf = [0xAAu8; PHRASE_CAPACITY];
            let n = format_fuzzy_time(h, m, &mut buf, style).unwrap();
            assert!(n <= MAX_PHRASE_LEN, "{h}:{m} gave {n} bytes");
            assert_eq!(buf[n], 0, "{h}:{m} not terminated");
            assert!(!buf[..n].contains(&0));
        }
    }
}

#[test]
fn phrases_are_plain_lowercase_words() {
    for style in STYLES {
        for (h, m) in every_minute() {
            let phrase = fuzzy_time(h, m, style).unwrap();
            assert!(!phrase.is_empty());
            assert!(!phrase.starts_with(' ') && !phrase.ends_with(' '), "{h}:{m} '{phrase}'");
            assert!(!phrase.contains("  "), "{h}:{m} '{phrase}'");
            assert!(
                phrase.chars().all(|c| c.is_ascii_lowercase() || c == ' ' || c == '\''),
                "{h}:{m} '{phrase}'"
            );
        }
    }
}

#[test]
fn same_input_same_output() {
    for (h, m) in every_minute() {
        let mut a = [0u8; PHRASE_CAPACITY];
        let mut b = [0xFFu8; PHRASE_CAPACITY];
        let na = format_fuzzy_time(h, m, &mut a, HourStyle::OClock).unwrap();
        let nb = format_fuzzy_time(h, m, &mut b, HourStyle::OClock).unwrap();
        assert_eq!(a[..=na], b[..=nb]);
    }
}

#[test]
fn buffer_and_phrase_agree() {
    for (h, m) in every_minute() {
        let mut buf = [0u8; PHRASE_CAPACITY];
        let n = format_fuzzy_time(h, m, &mut buf, HourStyle::Named).unwrap();
        let phrase = fuzzy_time(h, m, HourStyle::Named).unwrap();
        assert_eq!(&buf[..n], phrase.as_bytes());
    }
}

#[test]
fn five_minute_blocks_share_a_phrase() {
    // minutes 58..=02 around every hour, 03..=07 and so on
    for h in 0..24u32 {
        for m in (3..58).step_by(5) {
            let first = fuzzy_time(h, m, HourStyle::OClock).unwrap();
            for k in 1..5 {
                assert_eq!(fuzzy_time(h, m + k, HourStyle::OClock).unwrap(), first, "{h}:{}", m + k);
            }
        }
        let next = (h + 1) % 24;
        let top = fuzzy_time(next, 0, HourStyle::OClock).unwrap();
        assert_eq!(fuzzy_time(h, 58, HourStyle::OClock).unwrap(), top);
        assert_eq!(fuzzy_time(h, 59, HourStyle::OClock).unwrap(), top);
        assert_eq!(fuzzy_time(next, 2, HourStyle::OClock).unwrap(), top);
    }
}

#[test]
fn named_only_differs_at_midnight_and_noon() {
    for (h, m) in every_minute() {
        let plain = fuzzy_time(h, m, HourStyle::OClock).unwrap();
        let named = fuzzy_time(h, m, HourStyle::Named).unwrap();
        if plain.contains("twelve") {
            assert!(named.contains("midnight") || named.contains("noon"), "{h}:{m}");
        } else {
            assert_eq!(plain, named, "{h}:{m}");
        }
    }
}

#[test]
fn every_small_capacity_truncates_safely() {
    let full = fuzzy_time(10, 45, HourStyle::OClock).unwrap();
    for cap in 1..=full.len() {
        let mut buf = vec![0xAAu8; cap + 4];
        let res = format_fuzzy_time(10, 45, &mut buf[..cap], HourStyle::OClock);
        match res {
            Err(FuzzyTimeError::BufferTooSmall { capacity, written, needed }) => {
                assert_eq!(capacity, cap);
                assert_eq!(written, cap - 1);
                assert_eq!(needed, full.len());
                assert_eq!(&buf[..written], &full.as_bytes()[..written]);
                assert_eq!(buf[written], 0);
            }
            other => panic!("capacity {cap}: {other:?}"),
        }
        assert!(buf[cap..].iter().all(|&b| b == 0xAA), "wrote past capacity {cap}");
    }
    let mut exact = vec![0u8; full.len() + 1];
    assert_eq!(format_fuzzy_time(10, 45, &mut exact, HourStyle::OClock), Ok(full.len()));
}

#[test]
fn out_of_range_is_rejected_for_every_style() {
    let mut buf = [7u8; 8];
    for style in STYLES {
        assert_eq!(format_fuzzy_time(24, 0, &mut buf, style), Err(FuzzyTimeError::InvalidHour(24)));
        assert_eq!(format_fuzzy_time(0, 60, &mut buf, style), Err(FuzzyTimeError::InvalidMinute(60)));
    }
    assert_eq!(buf, [7u8; 8]);
}
