//! Support for command line argument parsing.
//!
//! See [crate] documentation for details on command line arguments and examples.

use std::error::Error;
use std::ffi::OsString;
use std::fmt::{Display, Debug};
use std::num::NonZero;

/// The error type for parsing command line arguments.
#[cfg_attr(test, derive(PartialEq))]
pub enum ArgumentsError {
	/// The option was unrecognized. The option is returned as the payload of this variant.
	UnrecognizedOption(String),
	/// Error converting an option or parameter to UTF-8. The argument index and original
	/// [`OsString`] that could not be converted are returned as the payload of this variant.
	InvalidUTF8(usize, OsString),
	/// The provided frame count was invalid. The supplied count argument is returned as the
	/// payload of this variant.
	InvalidCount(String),
	/// The provided tone frequency was invalid. The supplied frequency argument is returned as
	/// the payload of this variant.
	InvalidFrequency(String),
	/// The provided sample rate was invalid. The supplied rate argument is returned as the
	/// payload of this variant.
	InvalidRate(String),
	/// The parameter for an option was not supplied. The option is returned as the payload for
	/// this variant.
	MissingParameter(String),
	/// Help option (-h) was included, so print help details and exit.
	Help
}

impl Display for ArgumentsError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ArgumentsError::UnrecognizedOption(s) => write!(f, "Unrecognized option: {}", s),
			ArgumentsError::InvalidUTF8(i, v) => write!(f, "Invalid UTF-8 in argument {}: {:?}", i, v),
			ArgumentsError::InvalidCount(s) => write!(f, "Invalid count: {}", s),
			ArgumentsError::InvalidFrequency(s) => write!(f, "Invalid frequency: {}", s),
			ArgumentsError::InvalidRate(s) => write!(f, "Invalid sample rate: {}", s),
			ArgumentsError::MissingParameter(s) => write!(f, "Missing parameter for option {}", s),
			ArgumentsError::Help => write!(f, "Help requested")
		}
	}
}

impl Debug for ArgumentsError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		Display::fmt(self, f)
	}
}

impl Error for ArgumentsError {}

/// Convert an argument to [`&str`].
///
/// The function takes the argument index `i`, optional argument name `a`, and the argument `s`.
///
/// # Errors
///
/// Returns [`ArgumentsError::InvalidUTF8`] if the argument could not be converted to UTF-8 or
/// [`ArgumentsError::MissingParameter`] if the argument is `None`.
fn arg_to_str<'a, 'b>(i: usize, a: Option<&'a str>, s: Option<&'b OsString>)
	-> Result<&'b str, ArgumentsError>
{
	match s {
		Some(v) => v.to_str().ok_or_else(|| ArgumentsError::InvalidUTF8(i, v.clone())),
		None => Err(ArgumentsError::MissingParameter(a.map(String::from).unwrap_or_default()))
	}
}

/// Parsed command line arguments.
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct Arguments {
	/// The number of frames to play, or `None` to play until stopped.
	pub count: Option<NonZero<usize>>,
	/// The tone frequency, in Hz.
	pub freq: f32,
	/// The sample rate, in Hz.
	pub rate: u32
}

impl Arguments {
	/// Parse command line arguments.
	///
	/// The input can be any type that implements [`Iterator`] that yields [`OsString`], though
	/// typically this would be [`std::env::args_os`]. This function assumes that the application
	/// name is **not** supplied as the first item yielded by `args`, see examples for common use.
	///
	/// # Errors
	///
	/// This function can return any of the variants in [`ArgumentsError`]. See that documentation
	/// for more details.
	///
	/// # Examples
	///
	/// ```
	/// let args = match Arguments::parse(std::env::args_os().skip(1)) {
	/// 	Ok(a) => a,
	/// 	Err(e) => {
	/// 		// Handle error
	/// 		panic!("{}", e);
	/// 	}
	/// };
	/// ```
	pub fn parse(mut args: impl Iterator<Item = OsString>) -> Result<Arguments, ArgumentsError> {
		let mut count: Option<NonZero<usize>> = None;
		let mut freq: f32 = 1000.;
		let mut rate: u32 = 44100;
		let mut arg = args.next();
		let mut i = 0;
		loop {
			if arg.is_none() { break; }
			match arg_to_str(i, None, arg.as_ref())? {
				n @ ("-n" | "-c" | "--count") => {
					count = Some(
						arg_to_str(i+1, Some(n), args.next().as_ref())
						.and_then(
							|v| v.parse().map_err(|_| ArgumentsError::InvalidCount(v.to_string()))
						)?
					);
					// Increment because we called args.next()
					i += 1;
				},
				n @ ("-f" | "--freq") => {
					let next = args.next();
					let v = arg_to_str(i+1, Some(n), next.as_ref())?;
					freq = v.parse()
						.ok()
						.filter(|f: &f32| f.is_finite() && *f > 0.)
						.ok_or_else(|| ArgumentsError::InvalidFrequency(v.to_string()))?;
					// Increment because we called args.next()
					i += 1;
				},
				n @ ("-r" | "--rate") => {
					let next = args.next();
					let v = arg_to_str(i+1, Some(n), next.as_ref())?;
					rate = v.parse::<NonZero<u32>>()
						.map(NonZero::get)
						.map_err(|_| ArgumentsError::InvalidRate(v.to_string()))?;
					// Increment because we called args.next()
					i += 1;
				},
				"-h" | "--help" => return Err(ArgumentsError::Help),
				v => return Err(ArgumentsError::UnrecognizedOption(v.to_string()))
			}
			arg = args.next();
			// Increment because we called args.next()
			i += 1;
		}

		Ok(Arguments {
			count,
			freq,
			rate
		})
	}
}
