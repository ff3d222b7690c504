//! Waveform synthesis for JJY symbols.
//!
//! Each symbol is rendered as a pure sine burst whose length carries the symbol: 0.8 s for a
//! marker, 0.5 s for a one, 0.2 s for a zero. The real JJY broadcast keys the carrier *down*
//! for these intervals; emitting the tone-on length directly is a deliberate simplification
//! that consumer receivers sitting next to a speaker still decode, because the per-second
//! amplitude envelope is what they measure.
//!
//! Rendering is pure computation. Per-second cadence is the emitter's job, not the
//! synthesizer's: a burst is always shorter than one second and the emitter idles out the
//! remainder.

use std::f32::consts::PI;
use crate::frame::Symbol;

/// Default tone frequency, in Hz.
pub const DEFAULT_FREQUENCY: f32 = 1000.0;

/// Default sample rate, in Hz.
pub const DEFAULT_RATE: u32 = 44100;

/// Peak amplitude of rendered tones, kept well below full scale.
const AMPLITUDE: f32 = 0.5;

/// Tone-on time for a symbol, in milliseconds. Always less than 1000.
pub fn tone_millis(symbol: Symbol) -> u64 {
	match symbol {
		Symbol::Marker => 800,
		Symbol::One => 500,
		Symbol::Zero => 200
	}
}

/// Sine tone renderer with a fixed frequency and sample rate.
///
/// # Examples
///
/// ```
/// # use jjy::frame::Symbol;
/// # use jjy::synth::Synth;
/// let synth = Synth::default();
/// let samples = synth.render(Symbol::Marker);
/// // 0.8 s at 44100 Hz
/// assert_eq!(samples.len(), 35280);
/// ```
#[derive(Clone, Copy)]
pub struct Synth {
	/// Tone frequency in Hz.
	freq: f32,
	/// Sample rate in Hz.
	rate: u32
}

impl Synth {
	/// Create a renderer for the given tone frequency and sample rate.
	pub fn new(freq: f32, rate: u32) -> Synth {
		Synth { freq, rate }
	}

	/// The sample rate buffers are rendered at, in Hz.
	pub fn rate(&self) -> u32 {
		self.rate
	}

	/// Render the tone burst for one symbol.
	///
	/// Returns `rate * duration` mono samples of a sine at the configured frequency, starting
	/// at phase zero, amplitude 0.5.
	pub fn render(&self, symbol: Symbol) -> Vec<f32> {
		let count = (self.rate as u64 * tone_millis(symbol) / 1000) as usize;
		let step = 2. * PI * self.freq / self.rate as f32;
		(0..count).map(|i| AMPLITUDE * (step * i as f32).sin()).collect()
	}
}

impl Default for Synth {
	/// A renderer at [`DEFAULT_FREQUENCY`] and [`DEFAULT_RATE`].
	fn default() -> Synth {
		Synth::new(DEFAULT_FREQUENCY, DEFAULT_RATE)
	}
}
