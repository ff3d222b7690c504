//! Real-time frame emission.
//!
//! [`Emitter`] plays a [`BitFrame`] at exactly one symbol per wall-clock second. Playback of a
//! burst blocks, so per-second cadence is enforced by idling out the remainder of each second
//! against an absolute deadline computed from a monotonic anchor. A fixed `sleep(1 - duration)`
//! would let synthesis cost and audio latency accumulate until the signal slid off the
//! receiver's second boundary; deadline scheduling keeps cumulative drift bounded by a single
//! bit's jitter no matter how many frames are played.
//!
//! The audio device, clock and display are trait seams so the timing behavior is testable
//! without real hardware or real minutes.

use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use std::{fmt, thread};

use jst::Tm;
use crate::frame::BitFrame;
use crate::synth::Synth;

/// Boxed error from an audio backend.
pub type SinkError = Box<dyn Error + Send + Sync>;

/// Blocking audio output boundary.
pub trait AudioSink {
	/// Play `samples` (mono, at `rate` Hz) and do not return until playback has completed.
	///
	/// # Errors
	///
	/// A submission failure is fatal to the bit being played; the emitter aborts the frame
	/// rather than desynchronize it.
	fn play(&mut self, samples: &[f32], rate: u32) -> Result<(), SinkError>;
}

/// Monotonic clock used for per-bit scheduling.
pub trait Clock {
	/// The current instant.
	fn now(&self) -> Instant;
	/// Block for `duration`.
	fn sleep(&mut self, duration: Duration);
}

/// The system clock: [`Instant::now`] and [`thread::sleep`].
#[derive(Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> Instant {
		Instant::now()
	}

	fn sleep(&mut self, duration: Duration) {
		thread::sleep(duration);
	}
}

/// Per-second view of an in-progress frame, handed to the display boundary.
pub struct Snapshot<'a> {
	/// The timestamp the frame encodes.
	pub time: &'a Tm,
	/// Zero-based second within the frame about to be played.
	pub second: usize,
	/// The full frame.
	pub frame: &'a BitFrame
}

/// Display boundary, fed one [`Snapshot`] per second.
///
/// Rendering cadence and technology are entirely the implementer's concern; the emitter only
/// guarantees one call per second, before that second's burst starts.
pub trait Monitor {
	fn observe(&mut self, snapshot: &Snapshot);
}

/// The no-op monitor, for headless use.
impl Monitor for () {
	fn observe(&mut self, _: &Snapshot) {}
}

/// How an emission pass ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
	/// All 60 symbols were played.
	Completed,
	/// The stop flag was observed at a bit boundary. Not an error: this is the normal terminal
	/// transition of the emission loop.
	Stopped
}

/// The error type for frame emission.
pub enum EmitError {
	/// Audio submission failed while playing the given second. The frame is desynchronized and
	/// must be abandoned; retrying a bit late would itself violate the protocol.
	Audio(usize, SinkError)
}

impl fmt::Display for EmitError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			EmitError::Audio(s, e) => write!(f, "Audio submission failed at second {}: {}", s, e)
		}
	}
}

impl fmt::Debug for EmitError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}

impl Error for EmitError {}

/// Deadline-scheduled frame player.
///
/// The emitter owns the audio sink and the clock for the duration of playback. Its only state
/// that survives a frame is the monotonic anchor and the count of seconds played against it,
/// which together pin every future bit to an absolute deadline.
///
/// # Examples
///
/// ```
/// # use std::sync::atomic::AtomicBool;
/// # use jjy::emit::{AudioSink, Emitter, Outcome, SinkError};
/// # use jjy::frame;
/// # use jjy::synth::Synth;
/// struct Mute;
/// impl AudioSink for Mute {
/// 	fn play(&mut self, _: &[f32], _: u32) -> Result<(), SinkError> { Ok(()) }
/// }
///
/// let time = jst::Tm::new(1704564240 + jst::JST_OFFSET).unwrap();
/// let frame = frame::encode(&time).unwrap();
/// let mut emitter = Emitter::new(Mute, Synth::default());
///
/// // Stop already requested: the emitter exits at the first bit boundary
/// let stop = AtomicBool::new(true);
/// let outcome = emitter.emit(&frame, &time, &mut (), &stop).unwrap();
/// assert_eq!(outcome, Outcome::Stopped);
/// ```
pub struct Emitter<S: AudioSink, C: Clock = SystemClock> {
	sink: S,
	clock: C,
	synth: Synth,
	/// Monotonic anchor all bit deadlines are computed from. Set when the first bit plays.
	anchor: Option<Instant>,
	/// Seconds played since `anchor`.
	played: u64
}

impl<S: AudioSink> Emitter<S, SystemClock> {
	/// Create an emitter driven by the system clock.
	pub fn new(sink: S, synth: Synth) -> Emitter<S, SystemClock> {
		Emitter::with_clock(sink, synth, SystemClock)
	}
}

impl<S: AudioSink, C: Clock> Emitter<S, C> {
	/// Create an emitter driven by a caller-supplied clock.
	pub fn with_clock(sink: S, synth: Synth, clock: C) -> Emitter<S, C> {
		Emitter {
			sink,
			clock,
			synth,
			anchor: None,
			played: 0
		}
	}

	/// Play one frame at one symbol per second.
	///
	/// For each symbol: check `stop`, notify `monitor`, render the burst, submit it to the sink
	/// (blocking), then sleep only until the bit's absolute deadline. A bit that ran long gets
	/// no idle at all and the following bits absorb the overrun, so the 60-second frame ends on
	/// its deadline whenever the per-bit budget allows.
	///
	/// `stop` is checked at every bit boundary and never mid-waveform, so a stop request takes
	/// effect within one second and the sink is always left idle.
	///
	/// # Errors
	///
	/// Returns [`EmitError::Audio`] if the sink rejects a submission. The frame is abandoned
	/// immediately: skipping or retrying a bit would desynchronize the receiver.
	pub fn emit(
		&mut self,
		frame: &BitFrame,
		time: &Tm,
		monitor: &mut impl Monitor,
		stop: &AtomicBool
	) -> Result<Outcome, EmitError> {
		let anchor = match self.anchor {
			Some(a) => a,
			None => {
				let a = self.clock.now();
				self.anchor = Some(a);
				a
			}
		};

		for (second, symbol) in frame.iter().enumerate() {
			if stop.load(Ordering::Relaxed) {
				return Ok(Outcome::Stopped);
			}
			monitor.observe(&Snapshot { time, second, frame });

			let samples = self.synth.render(symbol);
			self.sink
				.play(&samples, self.synth.rate())
				.map_err(|e| EmitError::Audio(second, e))?;

			self.played += 1;
			let deadline = anchor + Duration::from_secs(self.played);
			// Idle only the remaining delta, clamped at zero for late bits
			if let Some(idle) = deadline.checked_duration_since(self.clock.now()) {
				self.clock.sleep(idle);
			}
		}

		Ok(Outcome::Completed)
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;
	use super::*;
	use crate::frame::{self, Symbol};
	use crate::synth::tone_millis;

	/// Virtual clock: `sleep` and sink busy time advance it, nothing else does.
	#[derive(Clone)]
	struct TestClock {
		base: Instant,
		offset: Rc<RefCell<Duration>>,
		slept: Rc<RefCell<Duration>>
	}

	impl TestClock {
		fn new() -> TestClock {
			TestClock {
				base: Instant::now(),
				offset: Rc::new(RefCell::new(Duration::ZERO)),
				slept: Rc::new(RefCell::new(Duration::ZERO))
			}
		}

		fn advance(&self, duration: Duration) {
			*self.offset.borrow_mut() += duration;
		}

		fn elapsed(&self) -> Duration {
			*self.offset.borrow()
		}

		fn slept(&self) -> Duration {
			*self.slept.borrow()
		}
	}

	impl Clock for TestClock {
		fn now(&self) -> Instant {
			self.base + *self.offset.borrow()
		}

		fn sleep(&mut self, duration: Duration) {
			self.advance(duration);
			*self.slept.borrow_mut() += duration;
		}
	}

	/// Sink that records submissions and takes a configurable amount of virtual time per play.
	struct TestSink {
		clock: TestClock,
		busy: Duration,
		fail_at: Option<usize>,
		calls: Rc<RefCell<Vec<usize>>>
	}

	impl TestSink {
		fn new(clock: &TestClock, busy: Duration) -> (TestSink, Rc<RefCell<Vec<usize>>>) {
			let calls = Rc::new(RefCell::new(Vec::new()));
			let sink = TestSink {
				clock: clock.clone(),
				busy,
				fail_at: None,
				calls: calls.clone()
			};
			(sink, calls)
		}
	}

	impl AudioSink for TestSink {
		fn play(&mut self, samples: &[f32], _rate: u32) -> Result<(), SinkError> {
			if self.fail_at == Some(self.calls.borrow().len()) {
				return Err("device gone".into());
			}
			self.calls.borrow_mut().push(samples.len());
			self.clock.advance(self.busy);
			Ok(())
		}
	}

	fn make_frame() -> (BitFrame, Tm) {
		// Sun, Jan 7 2024 03:04:00 JST
		let time = jst::Tm::new(1704564240 + jst::JST_OFFSET).unwrap();
		(frame::encode(&time).unwrap(), time)
	}

	fn make_emitter(busy: Duration) -> (Emitter<TestSink, TestClock>, TestClock, Rc<RefCell<Vec<usize>>>) {
		let clock = TestClock::new();
		let (sink, calls) = TestSink::new(&clock, busy);
		(Emitter::with_clock(sink, Synth::default(), clock.clone()), clock, calls)
	}

	#[test]
	fn cadence_test() {
		// Instantaneous playback: each bit idles a full second, the frame lasts exactly 60
		let (mut emitter, clock, calls) = make_emitter(Duration::ZERO);
		let (frame, time) = make_frame();
		let stop = AtomicBool::new(false);

		let outcome = emitter.emit(&frame, &time, &mut (), &stop).unwrap();
		assert_eq!(outcome, Outcome::Completed);
		assert_eq!(calls.borrow().len(), 60);
		assert_eq!(clock.elapsed(), Duration::from_secs(60));
		assert_eq!(clock.slept(), Duration::from_secs(60));

		// Submitted burst lengths match the symbol durations
		for (len, symbol) in calls.borrow().iter().zip(frame.iter()) {
			assert_eq!(*len as u64, 44100 * tone_millis(symbol) / 1000);
		}
	}

	#[test]
	fn drift_absorption_test() {
		// 300 ms of playback per bit: idles shrink to 700 ms, frame still ends on 60 s exactly
		let (mut emitter, clock, _) = make_emitter(Duration::from_millis(300));
		let (frame, time) = make_frame();
		let stop = AtomicBool::new(false);

		assert_eq!(emitter.emit(&frame, &time, &mut (), &stop).unwrap(), Outcome::Completed);
		assert_eq!(clock.elapsed(), Duration::from_secs(60));
		assert_eq!(clock.slept(), Duration::from_secs(42));
	}

	#[test]
	fn overrun_test() {
		// Every bit takes 1.5 s: deadlines are always missed, so idles clamp to zero instead of
		// going negative
		let (mut emitter, clock, _) = make_emitter(Duration::from_millis(1500));
		let (frame, time) = make_frame();
		let stop = AtomicBool::new(false);

		assert_eq!(emitter.emit(&frame, &time, &mut (), &stop).unwrap(), Outcome::Completed);
		assert_eq!(clock.slept(), Duration::ZERO);
		assert_eq!(clock.elapsed(), Duration::from_secs(90));
	}

	#[test]
	fn anchor_test() {
		// The anchor survives frames: two frames back to back end at exactly 120 s
		let (mut emitter, clock, _) = make_emitter(Duration::from_millis(100));
		let (frame, time) = make_frame();
		let stop = AtomicBool::new(false);

		emitter.emit(&frame, &time, &mut (), &stop).unwrap();
		emitter.emit(&frame, &time, &mut (), &stop).unwrap();
		assert_eq!(clock.elapsed(), Duration::from_secs(120));
	}

	/// Monitor that requests a stop while a given second is playing.
	struct StopAt<'a> {
		second: usize,
		stop: &'a AtomicBool
	}

	impl Monitor for StopAt<'_> {
		fn observe(&mut self, snapshot: &Snapshot) {
			if snapshot.second == self.second {
				self.stop.store(true, Ordering::Relaxed);
			}
		}
	}

	#[test]
	fn stop_test() {
		// Stop requested during bit 5: bit 5 finishes, bit 6 never starts
		let (mut emitter, _, calls) = make_emitter(Duration::ZERO);
		let (frame, time) = make_frame();
		let stop = AtomicBool::new(false);
		let mut monitor = StopAt { second: 5, stop: &stop };

		let outcome = emitter.emit(&frame, &time, &mut monitor, &stop).unwrap();
		assert_eq!(outcome, Outcome::Stopped);
		assert_eq!(calls.borrow().len(), 6);
	}

	#[test]
	fn stop_before_start_test() {
		let (mut emitter, _, calls) = make_emitter(Duration::ZERO);
		let (frame, time) = make_frame();
		let stop = AtomicBool::new(true);

		let outcome = emitter.emit(&frame, &time, &mut (), &stop).unwrap();
		assert_eq!(outcome, Outcome::Stopped);
		assert!(calls.borrow().is_empty());
	}

	#[test]
	fn audio_failure_test() {
		let clock = TestClock::new();
		let (mut sink, calls) = TestSink::new(&clock, Duration::ZERO);
		sink.fail_at = Some(3);
		let mut emitter = Emitter::with_clock(sink, Synth::default(), clock.clone());
		let (frame, time) = make_frame();
		let stop = AtomicBool::new(false);

		let err = emitter.emit(&frame, &time, &mut (), &stop).unwrap_err();
		let EmitError::Audio(second, _) = err;
		assert_eq!(second, 3);
		// Bits 0-2 played, bit 3 failed, bit 4 never started
		assert_eq!(calls.borrow().len(), 3);
	}

	#[test]
	fn monitor_test() {
		// One snapshot per second, in order, with the full frame visible each time
		struct Record(Vec<(usize, Symbol)>);
		impl Monitor for Record {
			fn observe(&mut self, snapshot: &Snapshot) {
				self.0.push((snapshot.second, snapshot.frame[snapshot.second]));
			}
		}

		let (mut emitter, _, _) = make_emitter(Duration::ZERO);
		let (frame, time) = make_frame();
		let stop = AtomicBool::new(false);
		let mut monitor = Record(Vec::new());

		emitter.emit(&frame, &time, &mut monitor, &stop).unwrap();
		assert_eq!(monitor.0.len(), 60);
		for (i, (second, symbol)) in monitor.0.iter().enumerate() {
			assert_eq!(*second, i);
			assert_eq!(*symbol, frame[i]);
		}
	}
}
