//! Microphone level sampling for waveform rendering.

use crate::backend::CaptureGraphBackend;
use rand::Rng;
use tracing::debug;

/// Lower bound of the idle animation walk.
const IDLE_FLOOR: f32 = 0.05;
/// Upper bound of the idle animation walk.
const IDLE_CEILING: f32 = 0.15;
/// Maximum per-frame step of the idle walk.
const IDLE_STEP: f32 = 0.01;
/// Resting level idle bars start from.
const IDLE_REST: f32 = 0.1;

/// Produces normalized volume buckets from an audio-analysis graph.
///
/// Acquisition is two-phase — `init` acquires the processing graph,
/// `start_microphone_capture` connects the microphone — and both report
/// failure as a boolean result rather than an error, leaving the
/// sampler inactive. Callers render [`idle_bars`] while capture is
/// inactive.
///
/// [`idle_bars`]: AudioLevelSampler::idle_bars
pub struct AudioLevelSampler<B: CaptureGraphBackend> {
    backend: B,
    initialized: bool,
    active: bool,
    idle: Vec<f32>,
}

impl<B: CaptureGraphBackend> AudioLevelSampler<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            initialized: false,
            active: false,
            idle: Vec::new(),
        }
    }

    /// Whether the host has an audio-processing graph.
    pub fn is_supported(&self) -> bool {
        self.backend.is_supported()
    }

    /// Acquires the audio-processing graph. Safe to call repeatedly.
    pub fn init(&mut self) -> bool {
        if self.initialized {
            return true;
        }
        self.initialized = self.backend.init_graph();
        if !self.initialized {
            debug!("audio graph unavailable, sampler stays inactive");
        }
        self.initialized
    }

    /// Requests microphone access and connects it into the graph.
    ///
    /// Returns `false` on permission denial or missing device, leaving
    /// the sampler inactive.
    pub fn start_microphone_capture(&mut self) -> bool {
        if !self.initialized {
            return false;
        }
        if self.active {
            return true;
        }
        self.active = self.backend.open_microphone();
        if !self.active {
            debug!("microphone capture unavailable");
        }
        self.active
    }

    /// Whether microphone capture is connected.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Partitions the current frequency snapshot into `bar_count`
    /// contiguous buckets, averaging each and normalizing to [0, 1].
    ///
    /// An inactive sampler yields all zeros.
    pub fn normalized_bars(&self, bar_count: usize) -> Vec<f32> {
        if bar_count == 0 {
            return Vec::new();
        }
        if !self.active {
            return vec![0.0; bar_count];
        }

        let data = self.backend.frequency_snapshot();
        if data.is_empty() {
            return vec![0.0; bar_count];
        }

        let step = (data.len() / bar_count).max(1);
        (0..bar_count)
            .map(|i| {
                let start = (i * step).min(data.len());
                let end = (start + step).min(data.len());
                let slice = &data[start..end];
                if slice.is_empty() {
                    0.0
                } else {
                    let sum: u32 = slice.iter().map(|&b| b as u32).sum();
                    sum as f32 / slice.len() as f32 / 255.0
                }
            })
            .collect()
    }

    /// Advances and returns the synthetic idle animation: a bounded
    /// random walk, each bar stepping within ±0.01 and clamped to
    /// [0.05, 0.15].
    pub fn idle_bars(&mut self, bar_count: usize) -> &[f32] {
        self.idle.resize(bar_count, IDLE_REST);
        let mut rng = rand::thread_rng();
        for bar in &mut self.idle {
            let step = rng.gen_range(-IDLE_STEP..=IDLE_STEP);
            *bar = (*bar + step).clamp(IDLE_FLOOR, IDLE_CEILING);
        }
        &self.idle
    }

    /// Disconnects the microphone and stops its tracks. Idempotent.
    pub fn stop_microphone_capture(&mut self) {
        if self.active {
            self.backend.close_microphone();
            self.active = false;
        }
    }

    /// Releases everything the sampler acquired. Idempotent.
    pub fn cleanup(&mut self) {
        self.stop_microphone_capture();
        if self.initialized {
            self.backend.close_graph();
            self.initialized = false;
        }
    }
}

impl<B: CaptureGraphBackend> Drop for AudioLevelSampler<B> {
    fn drop(&mut self) {
        self.cleanup();
    }
}
