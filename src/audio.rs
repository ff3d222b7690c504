//! Audio output through the system's default device.
//!
//! [`Speaker`] opens a single mono output stream and exposes the blocking submit-and-wait
//! playback the emitter needs. Submitted samples are handed to the stream callback through a
//! shared pending buffer; `play` returns once the callback has drained it, with the stream
//! padding silence whenever nothing is pending.

use std::error::Error;
use std::sync::{Arc, Condvar, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::Sample;
use jjy::emit::{AudioSink, SinkError};

/// Samples waiting to be written to the device.
#[derive(Default)]
struct Pending {
	samples: Vec<f32>,
	pos: usize
}

impl Pending {
	fn drained(&self) -> bool {
		self.pos >= self.samples.len()
	}
}

/// State shared between [`Speaker::play`] and the stream callback.
struct Shared {
	pending: Mutex<Pending>,
	drained: Condvar
}

/// Fill an output buffer from the pending samples, padding with silence.
fn write_samples(shared: &Shared, data: &mut [f32]) {
	let mut pending = shared.pending.lock().unwrap();
	let pos = pending.pos;
	let n = data.len().min(pending.samples.len() - pos);
	data[..n].copy_from_slice(&pending.samples[pos..pos + n]);
	pending.pos += n;
	data.iter_mut().skip(n).for_each(|v| *v = f32::EQUILIBRIUM);
	if pending.drained() {
		shared.drained.notify_all();
	}
}

/// Error handler for audio streaming.
///
/// Panics and prints the error: with a dead stream the pending buffer would never drain and the
/// emitter would block forever.
fn stream_error(error: cpal::StreamError) {
	panic!("Audio stream failed: {}", error);
}

/// Blocking speaker output over the default audio device.
pub struct Speaker {
	// Dropping the stream stops playback, so it is held even though never read
	_stream: cpal::Stream,
	shared: Arc<Shared>,
	rate: u32
}

impl Speaker {
	/// Open the default output device as a mono `f32` stream at `rate` Hz and start it.
	///
	/// # Errors
	///
	/// This function can generate a variety of errors, all wrapped in `Box<dyn Error>`:
	/// - `&str` if there is no default output audio device.
	/// - [`cpal::BuildStreamError`], [`cpal::PlayStreamError`] from configuring and starting the
	///   stream, e.g. if the device does not support `rate`.
	pub fn new(rate: u32) -> Result<Speaker, Box<dyn Error>> {
		let host = cpal::default_host();
		let device = host.default_output_device()
			.ok_or("Failed to get default audio output device")?;
		let config = cpal::StreamConfig {
			channels: 1,
			sample_rate: cpal::SampleRate(rate),
			buffer_size: cpal::BufferSize::Default,
		};

		let shared = Arc::new(Shared {
			pending: Mutex::new(Pending::default()),
			drained: Condvar::new()
		});
		let writer = shared.clone();
		let stream = device.build_output_stream(
						&config,
						move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
							write_samples(&writer, data)
						},
						stream_error,
						None)?;
		stream.play()?;

		Ok(Speaker {
			_stream: stream,
			shared,
			rate
		})
	}
}

impl AudioSink for Speaker {
	/// Queue `samples` for output and block until the stream callback has consumed them.
	///
	/// The stream runs at the rate fixed in [`Speaker::new`]; a submission at any other rate is
	/// a caller bug and surfaces as an error rather than pitch-shifted audio.
	fn play(&mut self, samples: &[f32], rate: u32) -> Result<(), SinkError> {
		if rate != self.rate {
			return Err(format!(
				"Sample rate mismatch: stream at {} Hz, submission at {} Hz", self.rate, rate
			).into());
		}

		let mut pending = self.shared.pending.lock().unwrap();
		pending.samples.clear();
		pending.samples.extend_from_slice(samples);
		pending.pos = 0;
		drop(
			self.shared.drained
				.wait_while(pending, |p| !p.drained())
				.map_err(|_| SinkError::from("Audio stream state poisoned"))?
		);
		Ok(())
	}
}
