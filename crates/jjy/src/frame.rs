//! JJY time-code frame construction.
//!
//! A JJY frame covers one minute of broadcast time: 60 symbols, one per second. Seconds 0, 9,
//! 19, 29, 39, 49 and 59 always carry position markers; the rest carry calendar fields in
//! binary-coded decimal, or are reserved and transmitted as zero. This module implements the
//! time-of-day portion of the code only: parity bits and the century, leap second and service
//! interruption indicators stay zero, which the deployed receivers tolerate.
//!
//! The weekday occupies seconds 50-52 as in the on-air JJY code, least significant bit first,
//! with 0 meaning Sunday.
//!
//! # Examples
//!
//! ```
//! # use jjy::frame::{self, Symbol};
//! // Sun, Jan 7 2024 03:04:00 JST
//! let time = jst::Tm::new(1704564240 + jst::JST_OFFSET).unwrap();
//! let frame = frame::encode(&time).unwrap();
//!
//! assert_eq!(frame[0], Symbol::Marker);
//! assert_eq!(frame.to_string(), "M00100100M000010000M000111000M000011000M000010000M000000000M");
//! ```

use std::ops::Index;
use std::{error, fmt};
use jst::Tm;

/// Number of symbols in one frame (one minute).
pub const FRAME_LEN: usize = 60;

/// Frame positions that always carry [`Symbol::Marker`], regardless of input.
pub const MARKERS: [usize; 7] = [0, 9, 19, 29, 39, 49, 59];

/// One second of the JJY time code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Symbol {
	/// Binary zero, also transmitted for all reserved positions.
	Zero,
	/// Binary one.
	One,
	/// Position marker. Structural, carries no data.
	Marker
}

impl From<bool> for Symbol {
	fn from(bit: bool) -> Self {
		if bit { Symbol::One } else { Symbol::Zero }
	}
}

impl fmt::Display for Symbol {
	/// Format as `0`, `1` or `M`.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Symbol::Zero => "0",
			Symbol::One => "1",
			Symbol::Marker => "M"
		})
	}
}

/// The error type for building frames.
#[cfg_attr(test, derive(PartialEq))]
pub enum FrameError {
	/// A calendar field was outside its valid range. The field name and offending value are
	/// provided in the payload.
	FieldRange(&'static str, u32),
	/// A value was not representable in the requested number of BCD digits. The value and digit
	/// count are provided in the payload.
	BcdRange(u32, u32)
}

impl fmt::Display for FrameError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FrameError::FieldRange(s, v) => write!(f, "Calendar field {} out of range: {}", s, v),
			FrameError::BcdRange(v, d) => write!(f, "Value {} not representable in {} BCD digits", v, d)
		}
	}
}

impl fmt::Debug for FrameError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}

impl error::Error for FrameError {}

/// A complete 60-symbol JJY frame.
///
/// Immutable once built; see [`encode`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BitFrame([Symbol; FRAME_LEN]);

impl BitFrame {
	/// The frame's symbols in transmission order.
	pub fn symbols(&self) -> &[Symbol; FRAME_LEN] {
		&self.0
	}

	/// Iterate over the symbols in transmission order.
	pub fn iter(&self) -> impl Iterator<Item = Symbol> + '_ {
		self.0.iter().copied()
	}
}

impl Index<usize> for BitFrame {
	type Output = Symbol;

	fn index(&self, second: usize) -> &Symbol {
		&self.0[second]
	}
}

impl fmt::Display for BitFrame {
	/// Format as 60 characters, e.g. `M00100100M00001M...`.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for symbol in self.iter() {
			fmt::Display::fmt(&symbol, f)?;
		}
		Ok(())
	}
}

/// Encode `value` as binary-coded decimal.
///
/// Returns `digits * 4` bits: decimal digits most significant first, each digit's four bits in
/// weight order 8, 4, 2, 1.
///
/// # Errors
///
/// Returns [`FrameError::BcdRange`] if `value >= 10^digits`. A calendar value that does not fit
/// its field indicates a bug upstream, so it is rejected rather than truncated.
///
/// # Examples
///
/// ```
/// # use jjy::frame::bcd;
/// assert_eq!(
/// 	bcd(24, 2).unwrap(),
/// 	vec![false, false, true, false, false, true, false, false]
/// );
/// assert!(bcd(100, 2).is_err());
/// ```
pub fn bcd(value: u32, digits: u32) -> Result<Vec<bool>, FrameError> {
	if value >= 10u32.pow(digits) {
		return Err(FrameError::BcdRange(value, digits));
	}

	let mut bits = Vec::with_capacity(digits as usize * 4);
	for d in (0..digits).rev() {
		let digit = value / 10u32.pow(d) % 10;
		for b in (0..4).rev() {
			bits.push(digit >> b & 1 == 1);
		}
	}
	Ok(bits)
}

/// Check that a calendar field is within its valid range.
fn check(field: &'static str, value: u32, min: u32, max: u32) -> Result<(), FrameError> {
	if value < min || value > max {
		Err(FrameError::FieldRange(field, value))
	} else {
		Ok(())
	}
}

/// Copy data bits into the frame starting at second `at`.
fn place(symbols: &mut [Symbol; FRAME_LEN], at: usize, bits: &[bool]) {
	for (i, &bit) in bits.iter().enumerate() {
		symbols[at + i] = Symbol::from(bit);
	}
}

/// Build the frame for one minute of broadcast time.
///
/// `time` must already be in Japan Standard Time; no timezone conversion happens here. The
/// function is pure: identical inputs yield bit-identical frames.
///
/// Field layout (positions inclusive, all BCD most significant bit first):
///
/// | Seconds | Field   | Width                                |
/// | ------- | ------- | ------------------------------------ |
/// | 1-8     | year    | 8 bits, year modulo 100              |
/// | 10-14   | month   | low 5 bits of BCD(month, 2)          |
/// | 20-25   | day     | low 6 bits of BCD(day, 2)            |
/// | 30-35   | hour    | low 6 bits of BCD(hour, 2)           |
/// | 40-46   | minute  | low 7 bits of BCD(minute, 2)         |
/// | 50-52   | weekday | 3 bits LSB first, 0=Sunday           |
///
/// The dropped high bits of the narrow fields are structurally zero for in-range values. All
/// remaining non-marker positions are transmitted as zero.
///
/// # Errors
///
/// Returns [`FrameError::FieldRange`] if a calendar field is outside its valid range. A
/// malformed timestamp indicates a broken clock source, not a recoverable condition.
///
/// # Examples
///
/// ```
/// # use jjy::frame;
/// let time = jst::now_jst().expect("Failed to get current time");
/// let frame = frame::encode(&time).unwrap();
/// println!("{}", frame);
/// ```
pub fn encode(time: &Tm) -> Result<BitFrame, FrameError> {
	check("month", time.mon as u32, 1, 12)?;
	check("day", time.day as u32, 1, 31)?;
	check("hour", time.hour as u32, 0, 23)?;
	check("minute", time.min as u32, 0, 59)?;
	check("weekday", time.wday as u32, 0, 6)?;

	let mut symbols = [Symbol::Zero; FRAME_LEN];
	for m in MARKERS {
		symbols[m] = Symbol::Marker;
	}

	place(&mut symbols, 1, &bcd(time.year as u32 % 100, 2)?);
	place(&mut symbols, 10, &bcd(time.mon as u32, 2)?[3..]);
	place(&mut symbols, 20, &bcd(time.day as u32, 2)?[2..]);
	place(&mut symbols, 30, &bcd(time.hour as u32, 2)?[2..]);
	place(&mut symbols, 40, &bcd(time.min as u32, 2)?[1..]);
	for i in 0..3 {
		symbols[50 + i] = Symbol::from(time.wday >> i & 1 == 1);
	}

	Ok(BitFrame(symbols))
}
