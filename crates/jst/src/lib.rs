//! Wall-clock source for Japan Standard Time.
//!
//! This crate reads the current Unix time with nanosecond granularity via
//! `libc::clock_gettime` and converts timestamps into Gregorian calendar dates without going
//! through libc's `gmtime`, making the conversion completely thread safe. JJY broadcasts JST
//! (UTC+9) exclusively, so the only timezone handling offered is the fixed [`JST_OFFSET`];
//! consumers receive timestamps already normalized to broadcast local time.
//!
//! # Examples
//!
//! ```
//! # use jst::Tm;
//! // 2024-01-07 03:04:00 +09:00
//! let date = Tm::new(1704564240 + jst::JST_OFFSET).unwrap();
//! assert_eq!(date, Tm {
//! 	year: 2024,
//! 	mon: 1,
//! 	day: 7,
//! 	hour: 3,
//! 	min: 4,
//! 	sec: 0,
//! 	wday: 0
//! });
//! ```

use core::fmt;
use core::mem::MaybeUninit;
use libc::{timespec, clock_gettime, CLOCK_REALTIME};

/// Offset of Japan Standard Time from UTC, in seconds (UTC+9). JST has no daylight saving.
pub const JST_OFFSET: i64 = 9 * 3600;

/// Seconds per minute.
const SECONDS_PER_MINUTE: i64 = 60;
/// Seconds per hour.
const SECONDS_PER_HOUR: i64 = SECONDS_PER_MINUTE * 60;
/// Seconds per day.
const SECONDS_PER_DAY: i64 = SECONDS_PER_HOUR * 24;
/// Days per week.
const DAYS_PER_WEEK: i64 = 7;
/// Days from March 1, year 0 to January 1, 1970 in the proleptic Gregorian calendar.
const DAYS_TO_UNIX_EPOCH: i64 = 719468;
/// Days per 400-year Gregorian cycle (the calendar repeats exactly on this period).
const DAYS_PER_ERA: i64 = 146097;

/// Unix time with nanosecond granularity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeSpec {
	/// Seconds since the Unix epoch.
	pub sec: i64,
	/// Nanoseconds since the beginning of `sec`, ranged [0, 999999999].
	pub nsec: i64
}

impl From<timespec> for TimeSpec {
	/// Convert from `libc::timespec` for better ergonomics.
	fn from(value: timespec) -> Self {
		TimeSpec {
			sec: value.tv_sec,
			nsec: value.tv_nsec
		}
	}
}

/// Get the current time as a Unix timestamp with nanosecond granularity.
///
/// Returns `None` if `libc::clock_gettime` fails.
///
/// This function is thread safe.
///
/// # Examples
///
/// ```
/// let c = jst::now().expect("Failed to get current time");
/// assert!(c.sec > 0);
/// ```
pub fn now() -> Option<TimeSpec> {
	let mut time = MaybeUninit::<timespec>::uninit();
	// Safety:
	// - clock_gettime does not read time, only writes
	// - if clock_gettime returns zero, time is successfully initialized
	unsafe {
		match clock_gettime(CLOCK_REALTIME, time.as_mut_ptr()) {
			0 => Some(time.assume_init().into()),
			_ => None
		}
	}
}

/// Get the current Japan Standard Time as a calendar date.
///
/// Returns `None` if the system clock cannot be read.
///
/// # Examples
///
/// ```
/// let date = jst::now_jst().expect("Failed to get current time");
/// assert!(date.year >= 2024);
/// ```
pub fn now_jst() -> Option<Tm> {
	let time = now()?;
	Tm::new(time.sec + JST_OFFSET)
}

/// Gregorian calendar date with second granularity.
///
/// Unlike `libc::tm`, `year` is the absolute calendar year (2024, not 124) and `mon` is ranged
/// [1, 12].
///
/// # Examples
///
/// ```
/// # use jst::Tm;
/// let date = Tm::new(1718617807).unwrap();
/// assert_eq!(date, Tm {
/// 	year: 2024,
/// 	mon: 6,
/// 	day: 17,
/// 	hour: 9,
/// 	min: 50,
/// 	sec: 7,
/// 	wday: 1
/// });
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tm {
	/// Absolute Gregorian calendar year.
	pub year: u16,
	/// Month of the year, ranged [1, 12].
	pub mon: u8,
	/// Day of the month, ranged [1, 31].
	pub day: u8,
	/// Hours, ranged [0, 23].
	pub hour: u8,
	/// Minutes, ranged [0, 59].
	pub min: u8,
	/// Seconds, ranged [0, 59].
	pub sec: u8,
	/// Day of the week, ranged [0, 6] => [Sunday, Saturday].
	pub wday: u8
}

impl Tm {
	/// Convert a Unix timestamp into a calendar date.
	///
	/// Only timestamps on or after the Unix epoch (Jan 1, 1970) are supported; negative inputs
	/// result in `None`.
	pub fn new(unixtimestamp: i64) -> Option<Tm> {
		// The Gregorian calendar repeats every 400 years. Rotating the year to run Mar-Feb puts
		// the leap day last, which makes the conversion from a day count to a date a handful of
		// divisions with no table lookups. Afterwards the year is un-rotated back to Jan-Dec.
		// Details: http://howardhinnant.github.io/date_algorithms.html#civil_from_days
		if unixtimestamp < 0 { return None }
		let days = unixtimestamp / SECONDS_PER_DAY;
		let rem = unixtimestamp % SECONDS_PER_DAY;
		let z = days + DAYS_TO_UNIX_EPOCH;
		let era = z / DAYS_PER_ERA;
		let doe = z % DAYS_PER_ERA;
		let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
		let y = yoe + era * 400;
		let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
		// Linear equation mapping a Mar-Feb day of year to its month
		let mp = (5 * doy + 2) / 153;
		// Linear equation mapping a day of year and month to the day of month
		let d = doy - (153 * mp + 2) / 5 + 1;
		// Un-rotate from Mar-Feb back to Jan-Dec
		let (m, y) = if mp < 10 { (mp + 3, y) } else { (mp - 9, y + 1) };

		Some(Tm {
			year: y as u16,
			mon: m as u8,
			day: d as u8,
			hour: (rem / SECONDS_PER_HOUR) as u8,
			min: (rem % SECONDS_PER_HOUR / SECONDS_PER_MINUTE) as u8,
			sec: (rem % SECONDS_PER_MINUTE) as u8,
			wday: ((days + 4) % DAYS_PER_WEEK) as u8 // Jan 1, 1970 was a Thursday
		})
	}
}

impl fmt::Display for Tm {
	/// Format as `YYYY-MM-DD hh:mm:ss`.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
			self.year, self.mon, self.day, self.hour, self.min, self.sec)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn epoch_test() {
		assert_eq!(Tm::new(0), Some(Tm {
			year: 1970,
			mon: 1,
			day: 1,
			hour: 0,
			min: 0,
			sec: 0,
			wday: 4
		}));

		assert_eq!(Tm::new(-1), None);
		assert_eq!(Tm::new(i64::MIN), None);
	}

	#[test]
	fn civil_test() {
		// Mon, Jun 17 2024 09:50:07 UTC
		assert_eq!(Tm::new(1718617807), Some(Tm {
			year: 2024,
			mon: 6,
			day: 17,
			hour: 9,
			min: 50,
			sec: 7,
			wday: 1
		}));

		// Sun, Jan 7 2024 03:04:00 JST
		assert_eq!(Tm::new(1704564240 + JST_OFFSET), Some(Tm {
			year: 2024,
			mon: 1,
			day: 7,
			hour: 3,
			min: 4,
			sec: 0,
			wday: 0
		}));

		// Sun, Dec 31 2023 23:59:59 UTC, last second of the year
		assert_eq!(Tm::new(1704067199), Some(Tm {
			year: 2023,
			mon: 12,
			day: 31,
			hour: 23,
			min: 59,
			sec: 59,
			wday: 0
		}));
	}

	#[test]
	fn leapday_test() {
		// Thu, Feb 29 2024 00:00:00 UTC
		assert_eq!(Tm::new(1709164800), Some(Tm {
			year: 2024,
			mon: 2,
			day: 29,
			hour: 0,
			min: 0,
			sec: 0,
			wday: 4
		}));

		// Tue, Feb 29 2000 00:00:00 UTC (century leap year)
		assert_eq!(Tm::new(951782400), Some(Tm {
			year: 2000,
			mon: 2,
			day: 29,
			hour: 0,
			min: 0,
			sec: 0,
			wday: 2
		}));

		// Thu, Mar 1 1900 00:00:00 UTC would exist, but 1900 had no Feb 29. Check the day after
		// Feb 28 2100 (not a leap year) is Mar 1.
		assert_eq!(Tm::new(4107542400), Some(Tm {
			year: 2100,
			mon: 3,
			day: 1,
			hour: 0,
			min: 0,
			sec: 0,
			wday: 1
		}));
	}

	#[test]
	fn now_test() {
		let c = now().expect("Failed to get current time");
		// Jan 1, 2020
		assert!(c.sec > 1577836800);
		assert!(c.nsec >= 0 && c.nsec < 1000000000);

		let date = now_jst().expect("Failed to get current time");
		assert!(date.year >= 2020);
	}

	#[test]
	fn display_test() {
		let date = Tm::new(1704564240 + JST_OFFSET).unwrap();
		assert_eq!(date.to_string(), "2024-01-07 03:04:00");

		let date = Tm::new(0).unwrap();
		assert_eq!(date.to_string(), "1970-01-01 00:00:00");
	}
}
