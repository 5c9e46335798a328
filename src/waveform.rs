//! Waveform visualization tap
//!
//! A fixed-capacity ring of the most recent mono-mixed samples, written from
//! the engine's audio-processing callback and read from the main thread for
//! visualization.
//!
//! ## Thread Safety
//!
//! Two threads touch the ring: the engine's processing thread appends via
//! [`WaveformTap::process`] and the main thread copies via
//! [`WaveformTap::read_latest`]. Both sides hold the mutex only for the
//! memory copy, never across engine calls; the append path is
//! latency-sensitive and must not block beyond that brief critical section.
//! The active flag stands in for the engine DSP's active state and is
//! checked without taking the lock.
//!
//! On wrap the ring evicts the oldest samples but always preserves at least
//! `min_retained` (the last requested read window) of the newest history, so
//! the visualizer never sees a discontinuity inside the window it just asked
//! for.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::trace;

/// Ring state guarded by the tap mutex
struct WaveState {
    /// Ring storage, length equals capacity
    samples: Vec<f32>,

    /// Index of the oldest buffered sample
    head: usize,

    /// Number of buffered samples (0..=capacity)
    len: usize,

    /// Newest history preserved across a wrap; set by the reader
    min_retained: usize,
}

/// Mutex-guarded waveform ring buffer plus DSP-style active flag
pub struct WaveformTap {
    active: AtomicBool,
    capacity: usize,
    state: Mutex<WaveState>,
}

impl WaveformTap {
    /// Create a tap with the given ring capacity in mono samples
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "waveform ring capacity must be non-zero");
        Self {
            active: AtomicBool::new(false),
            capacity,
            state: Mutex::new(WaveState {
                samples: vec![0.0; capacity],
                head: 0,
                len: 0,
                min_retained: 0,
            }),
        }
    }

    /// Ring capacity in mono samples
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Enable or disable sample capture (passthrough is unaffected)
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    /// Whether sample capture is enabled
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Number of buffered samples
    pub fn occupied(&self) -> usize {
        self.state.lock().unwrap().len
    }

    /// Discard all buffered samples (the read window hint is kept)
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        state.head = 0;
        state.len = 0;
    }

    /// Engine processing callback: pass `input` through and capture it
    ///
    /// Invoked on the engine's audio thread. `input` holds `channels`
    /// interleaved channels; it is copied to `output` unmodified, then mixed
    /// down to a mono channel average and appended to the ring when the tap
    /// is active.
    pub fn process(&self, input: &[f32], output: &mut [f32], channels: usize) {
        if input.is_empty() || channels == 0 {
            return;
        }

        let n = input.len().min(output.len());
        output[..n].copy_from_slice(&input[..n]);

        if !self.is_active() {
            return;
        }

        // Mono mixdown outside the lock
        let frames = input.len() / channels;
        let mut mono = Vec::with_capacity(frames);
        for frame in input.chunks_exact(channels) {
            mono.push(frame.iter().sum::<f32>() / channels as f32);
        }

        let mut state = self.state.lock().unwrap();
        for &sample in &mono {
            if state.len == self.capacity {
                // Wrap: drop everything but the newest min_retained samples
                let keep = state.min_retained.min(self.capacity - 1);
                state.head = (state.head + (state.len - keep)) % self.capacity;
                state.len = keep;
                trace!("waveform ring wrapped, retained {} samples", keep);
            }
            let idx = (state.head + state.len) % self.capacity;
            state.samples[idx] = sample;
            state.len += 1;
        }
    }

    /// Copy the newest `out.len()` samples in chronological order
    ///
    /// Records `out.len()` as the minimum history to retain across wraps.
    /// When fewer samples are buffered the remainder of `out` is
    /// zero-padded. Returns false when nothing has been buffered yet; `out`
    /// is untouched in that case.
    pub fn read_latest(&self, out: &mut [f32]) -> bool {
        let copied = {
            let mut state = self.state.lock().unwrap();
            state.min_retained = out.len();
            if state.len == 0 {
                return false;
            }

            let n = out.len().min(state.len);
            let start = (state.head + state.len - n) % self.capacity;
            for (i, slot) in out.iter_mut().take(n).enumerate() {
                *slot = state.samples[(start + i) % self.capacity];
            }
            n
        };

        // Zero-pad outside the lock
        for slot in &mut out[copied..] {
            *slot = 0.0;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono_input(samples: &[f32]) -> Vec<f32> {
        samples.to_vec()
    }

    #[test]
    fn test_passthrough_is_unmodified() {
        let tap = WaveformTap::new(16);
        let input = [0.1, 0.2, 0.3, 0.4];
        let mut output = [0.0; 4];

        // Inactive: still passes audio through
        tap.process(&input, &mut output, 2);
        assert_eq!(output, input);
        assert_eq!(tap.occupied(), 0);
    }

    #[test]
    fn test_inactive_tap_captures_nothing() {
        let tap = WaveformTap::new(16);
        let mut output = [0.0; 4];
        tap.process(&[0.5; 4], &mut output, 1);
        assert_eq!(tap.occupied(), 0);
    }

    #[test]
    fn test_mono_mixdown_is_channel_average() {
        let tap = WaveformTap::new(16);
        tap.set_active(true);

        // Two stereo frames: (0.2, 0.4) and (-1.0, 0.0)
        let input = [0.2, 0.4, -1.0, 0.0];
        let mut output = [0.0; 4];
        tap.process(&input, &mut output, 2);

        let mut window = [0.0; 2];
        assert!(tap.read_latest(&mut window));
        assert!((window[0] - 0.3).abs() < 1e-6);
        assert!((window[1] - (-0.5)).abs() < 1e-6);
    }

    #[test]
    fn test_read_latest_returns_newest_in_order() {
        let tap = WaveformTap::new(8);
        tap.set_active(true);

        let input = mono_input(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let mut output = vec![0.0; input.len()];
        tap.process(&input, &mut output, 1);

        let mut window = [0.0; 3];
        assert!(tap.read_latest(&mut window));
        assert_eq!(window, [3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_read_latest_zero_pads_when_underfilled() {
        let tap = WaveformTap::new(8);
        tap.set_active(true);

        let mut output = [0.0; 2];
        tap.process(&[7.0, 8.0], &mut output, 1);

        let mut window = [9.9; 4];
        assert!(tap.read_latest(&mut window));
        assert_eq!(window, [7.0, 8.0, 0.0, 0.0]);
    }

    #[test]
    fn test_empty_ring_reports_false() {
        let tap = WaveformTap::new(8);
        tap.set_active(true);

        let mut window = [1.0; 4];
        assert!(!tap.read_latest(&mut window));
        // Output untouched on the false path
        assert_eq!(window, [1.0; 4]);
    }

    #[test]
    fn test_wrap_preserves_last_read_window() {
        let tap = WaveformTap::new(8);
        tap.set_active(true);

        // Fill the ring: 1..=8
        let fill = mono_input(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let mut scratch = vec![0.0; fill.len()];
        tap.process(&fill, &mut scratch, 1);

        // Reader asks for a 3-sample window; 3 newest must survive wraps
        let mut window = [0.0; 3];
        assert!(tap.read_latest(&mut window));
        assert_eq!(window, [6.0, 7.0, 8.0]);

        // Overflow the full ring with one more sample
        let mut one = [0.0; 1];
        tap.process(&[9.0], &mut one, 1);

        // The retained window plus the new sample, in order
        assert_eq!(tap.occupied(), 4);
        let mut window = [0.0; 3];
        assert!(tap.read_latest(&mut window));
        assert_eq!(window, [7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_sustained_overrun_never_loses_retained_history() {
        let tap = WaveformTap::new(8);
        tap.set_active(true);

        let mut window = [0.0; 4];
        let _ = tap.read_latest(&mut window); // min_retained = 4

        // Write far more than capacity, one block at a time
        let mut scratch = [0.0; 2];
        for i in 0..100 {
            let block = [i as f32 * 2.0, i as f32 * 2.0 + 1.0];
            tap.process(&block, &mut scratch, 1);
        }

        // The newest 4 samples are always available
        assert!(tap.read_latest(&mut window));
        assert_eq!(window, [196.0, 197.0, 198.0, 199.0]);
    }

    #[test]
    fn test_reset_discards_history() {
        let tap = WaveformTap::new(8);
        tap.set_active(true);

        let mut scratch = [0.0; 3];
        tap.process(&[1.0, 2.0, 3.0], &mut scratch, 1);
        assert_eq!(tap.occupied(), 3);

        tap.reset();
        assert_eq!(tap.occupied(), 0);
        let mut window = [0.0; 2];
        assert!(!tap.read_latest(&mut window));
    }
}
