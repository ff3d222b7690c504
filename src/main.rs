//! Play the JJY time code through the default speaker.
//!
//! [JJY] is Japan's longwave time signal, decoded by radio-controlled clocks and watches. This
//! application encodes the current Japan Standard Time into JJY's 60-bit-per-minute frame and
//! plays each bit as an audible tone burst, one per second, through the default audio output.
//! Holding a receiver against the speaker stands in for the radio broadcast: the per-second
//! amplitude envelope is what the receiver measures, so no RF hardware is involved.
//!
//! [JJY]: https://en.wikipedia.org/wiki/JJY
//!
//! # Command Line Arguments
//!
//! General form: `jjytone [options...]`
//!
//! | Short form | Long form  | Argument    | Default   | Description                    |
//! | ---------- | ---------- | ----------- | --------- | ------------------------------ |
//! | `-n`, `-c` | `--count`  | Integer > 0 | Unlimited | The number of frames to play   |
//! | `-f`       | `--freq`   | Hz > 0      | 1000      | The tone frequency             |
//! | `-r`       | `--rate`   | Integer > 0 | 44100     | The audio output sample rate   |
//!
//! One frame lasts one minute. With no count, frames play until interrupted; Ctrl-C stops the
//! transmission at the next second boundary, never mid-tone.
//!
//! # Examples
//!
//! Transmit until interrupted with default settings
//! ```sh
//! jjytone
//! ```
//!
//! Transmit four frames at 880 Hz
//! ```sh
//! jjytone -n 4 -f 880
//! ```

use std::error::Error;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use args::{Arguments, ArgumentsError};
use audio::Speaker;
use display::Console;
use jjy::emit::{Emitter, Outcome};
use jjy::frame;
use jjy::synth::Synth;

mod args;
mod audio;
mod display;

/// Set by the SIGINT handler, observed by the emission loop at every second boundary.
static STOP: AtomicBool = AtomicBool::new(false);

/// SIGINT handler: request a stop at the next second boundary.
extern "C" fn request_stop(_: libc::c_int) {
	STOP.store(true, Ordering::Relaxed);
}

/// Transmission lifecycle, driven by [`run`].
enum State {
	/// Waiting to start.
	Idle,
	/// Frames are being encoded and played.
	Running,
	/// A stop was observed or the frame count was reached; terminal.
	Stopping
}

/// Encode-and-play loop.
///
/// Samples Japan Standard Time afresh for every frame, encodes it, and hands the frame to the
/// deadline-scheduled emitter with the console monitor attached. Runs until `args.count` frames
/// have played or a stop is requested.
///
/// # Errors
///
/// This function can generate a variety of errors, all wrapped in `Box<dyn Error>`:
/// - Anything from [`Speaker::new`] while acquiring the output device.
/// - `&str` if the system clock cannot be read.
/// - [`jjy::FrameError`] if the clock produces an invalid calendar date.
/// - [`jjy::EmitError`] if an audio submission fails mid-frame.
fn run(args: Arguments) -> Result<ExitCode, Box<dyn Error>> {
	let speaker = Speaker::new(args.rate)?;
	let mut emitter = Emitter::new(speaker, Synth::new(args.freq, args.rate));
	let mut console = Console;

	let mut state = State::Idle;
	let mut played = 0;
	loop {
		state = match state {
			State::Idle => {
				// Start the first bit on a whole second so the frame lines up with the wall
				// clock from the outset
				let time = jst::now().ok_or("Failed to get current system time")?;
				let wait = (1000000000 - time.nsec) as u64 % 1000000000;
				std::thread::sleep(Duration::from_nanos(wait));
				State::Running
			},
			State::Running => {
				let time = jst::now_jst().ok_or("Failed to get current system time")?;
				let frame = frame::encode(&time)?;
				match emitter.emit(&frame, &time, &mut console, &STOP)? {
					Outcome::Stopped => State::Stopping,
					Outcome::Completed => {
						played += 1;
						match args.count {
							Some(n) if played >= n.get() => State::Stopping,
							_ if STOP.load(Ordering::Relaxed) => State::Stopping,
							_ => State::Running
						}
					}
				}
			},
			State::Stopping => break
		};
	}

	println!();
	Ok(ExitCode::SUCCESS)
}

/// Main program entry point.
///
/// Parses input arguments, installs the Ctrl-C handler, and plays JJY frames until done. See
/// [`crate`] documentation for details.
fn main() -> ExitCode {
	let args = match Arguments::parse(std::env::args_os().skip(1)) {
		Ok(a) => a,
		Err(e) => {
			return if let ArgumentsError::Help = e {
				println!("\
Play the JJY time code through the default speaker for setting radio-controlled clocks.

Usage: jjytone [OPTIONS]

Options:
  -n, -c, --count <COUNT> the number of frames to play, default unlimited
  -f, --freq <HZ>         the tone frequency in Hz, default 1000
  -r, --rate <HZ>         the audio output sample rate in Hz, default 44100

One frame lasts one minute. Stop with Ctrl-C; playback ends at the next second boundary.

Examples:
  jjytone
  jjytone -n 4 -f 880\n");
				ExitCode::SUCCESS
			} else {
				eprintln!("{}", e);
				ExitCode::FAILURE
			}
		}
	};

	if args.freq * 2. > args.rate as f32 {
		println!(
			"Warning: tone frequency {} Hz is above the Nyquist limit at {} Hz output",
			args.freq, args.rate
		);
	}

	let handler = request_stop as extern "C" fn(libc::c_int);
	// Safety: request_stop only stores to an atomic, which is async-signal-safe
	unsafe {
		libc::signal(libc::SIGINT, handler as libc::sighandler_t);
	}

	run(args)
		.inspect_err(|e| eprintln!("{}", e))
		.unwrap_or(ExitCode::FAILURE)
}
