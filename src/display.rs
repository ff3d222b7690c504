//! Console rendering of the in-progress frame.

use std::io::{self, Write};

use jjy::emit::{Monitor, Snapshot};

/// Per-second console view of the transmission.
///
/// At each frame start a header line shows the encoded timestamp and the full 60-symbol
/// layout. During the frame a single progress line is rewritten in place, showing the second
/// being played and its symbol.
pub struct Console;

impl Monitor for Console {
	fn observe(&mut self, snapshot: &Snapshot) {
		if snapshot.second == 0 {
			println!("{}  {}", snapshot.time, snapshot.frame);
		}
		print!("\r{:02}s: {} ", snapshot.second, snapshot.frame[snapshot.second]);
		let _ = io::stdout().flush();
	}
}
