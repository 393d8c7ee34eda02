/*
 *  tick.rs
 *
 *  Tidey - fuzzy words watchface
 *  (c) 2020-26 Stuart Hunter
 *
 *  Minute tick - wake on every wall clock minute boundary
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
use chrono::{Local, Timelike};
use std::time::Duration;

const MINUTE: Duration = Duration::from_secs(60);

/// Time left until the next minute boundary, in (0, 60s].
pub fn until_next_minute<T: Timelike>(now: &T) -> Duration {
    // nanosecond() exceeds 1e9 during a leap second
    let into = Duration::from_secs(now.second() as u64)
        + Duration::from_nanos((now.nanosecond() % 1_000_000_000) as u64);
    MINUTE.saturating_sub(into).max(Duration::from_nanos(1))
}

/// Sleep until the local clock rolls over to the next minute.
pub async fn next_minute() {
    let wait = until_next_minute(&Local::now());
    tokio::time::sleep(wait).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn full_minute_on_the_boundary() {
        let t = NaiveTime::from_hms_opt(10, 15, 0).unwrap();
        assert_eq!(until_next_minute(&t), Duration::from_secs(60));
    }

    #[test]
    fn part_way_through() {
        let t = NaiveTime::from_hms_milli_opt(10, 15, 42, 250).unwrap();
        assert_eq!(until_next_minute(&t), Duration::from_millis(17_750));
    }

    #[test]
    fn never_zero() {
        let t = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap();
        assert_eq!(until_next_minute(&t), Duration::from_nanos(1));
        let leap = NaiveTime::from_hms_nano_opt(23, 59, 59, 1_500_000_000).unwrap();
        assert!(until_next_minute(&leap) > Duration::ZERO);
    }
}
