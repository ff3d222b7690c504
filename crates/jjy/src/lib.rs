//! JJY time-code encoding and audible emission.
//!
//! [JJY] is Japan's longwave time signal: one frame per minute, one amplitude-modulated symbol
//! per second, decoded by radio-controlled clocks. This crate builds those 60-symbol frames
//! from a calendar timestamp ([`frame`]), renders each symbol as an audible tone burst
//! ([`synth`]), and plays frames with second-exact, drift-corrected cadence ([`emit`]) through
//! a caller-supplied audio sink. A speaker held against a receiver's antenna stands in for the
//! transmitter.
//!
//! The audio device, scheduling clock and display surface are trait boundaries defined in
//! [`emit`]; this crate contains no I/O of its own.
//!
//! [JJY]: https://en.wikipedia.org/wiki/JJY
//!
//! # Examples
//!
//! ```
//! # use jjy::frame;
//! // Encode the current Japan Standard Time as a frame
//! let time = jst::now_jst().expect("Failed to get current time");
//! let frame = frame::encode(&time).expect("System clock produced an invalid date");
//!
//! // 60 symbols, markers every tenth second
//! println!("{} {}", time, frame);
//! ```

pub mod frame;
pub mod synth;
pub mod emit;

pub use frame::{BitFrame, FrameError, Symbol};
pub use synth::Synth;
pub use emit::{AudioSink, EmitError, Emitter, Monitor, Outcome, Snapshot};
