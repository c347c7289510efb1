//! Engine context and the two domain pumps
//!
//! [`Engine`] owns the whole playback pipeline: the tick-domain
//! [`Tracker`], the sample-domain [`Synth`], the [`OscillatorBank`]
//! hand-off between them, and the output [`FrameBuffer`]. There is no
//! process-wide singleton; the caller constructs an engine per song and
//! drives it through the two pump methods.
//!
//! For single-threaded use both pumps hang off `Engine` directly. For a
//! real deployment with a dedicated audio callback, [`Engine::split`]
//! separates the engine into a [`SequencerPump`] and a [`SynthPump`]
//! that can live on different threads; the synth side never blocks.

use std::sync::Arc;

use crate::output::FrameBuffer;
use crate::song::{SongData, CHANNELS};
use crate::synth::oscillator::{OscParams, OscillatorBank};
use crate::synth::Synth;
use crate::tracker::Tracker;
use crate::Result;

/// Milliseconds between sequencer ticks (50 Hz)
pub const TICK_INTERVAL_MS: u32 = 20;

/// Complete playback engine for one song
#[derive(Debug)]
pub struct Engine {
    sequencer: SequencerPump,
    synth: SynthPump,
}

impl Engine {
    /// Build an engine from a packed song blob: validates the blob,
    /// decodes the resource table, resets all channel and oscillator
    /// state, fills the output buffer with silence, and starts the
    /// transport in the playing state.
    pub fn new(blob: Vec<u8>) -> Result<Self> {
        let song = SongData::new(blob)?;
        let tracker = Tracker::new(song);

        let bank = Arc::new(OscillatorBank::new());
        bank.publish(tracker.osc_params());

        let buffer = Arc::new(FrameBuffer::with_default_capacity());
        buffer.fill_silence();

        let synth = Synth::new(Arc::clone(&bank));

        Ok(Engine {
            sequencer: SequencerPump {
                tracker,
                bank,
                last_update: None,
            },
            synth: SynthPump { synth, buffer },
        })
    }

    /// Tick pump; see [`SequencerPump::advance_sequencer`]
    pub fn advance_sequencer(&mut self, now_ms: u32) {
        self.sequencer.advance_sequencer(now_ms);
    }

    /// Sample pump; see [`SynthPump::produce_sample`]
    pub fn produce_sample(&mut self) -> u16 {
        self.synth.produce_sample()
    }

    /// Handle to the output buffer for the draining transport
    pub fn output_buffer(&self) -> Arc<FrameBuffer> {
        self.synth.output_buffer()
    }

    /// Whether the transport is still playing
    pub fn is_playing(&self) -> bool {
        self.sequencer.tracker.is_playing()
    }

    /// Observe and decrement an indicator line pulse
    pub fn indicator_ticks_remaining(&mut self, line: usize) -> u8 {
        self.sequencer.tracker.indicator_ticks_remaining(line)
    }

    /// Snapshot of the currently published oscillator parameters
    pub fn osc_snapshot(&self) -> [OscParams; CHANNELS] {
        self.sequencer.bank.snapshot()
    }

    /// The most recently produced output sample
    pub fn last_sample(&self) -> u16 {
        self.synth.synth.last_sample()
    }

    /// Tick-domain tracker, for metering and tests
    pub fn tracker(&self) -> &Tracker {
        &self.sequencer.tracker
    }

    /// Separate the engine into its two timing-domain halves so the
    /// sequencer can run on a control thread while the synthesizer runs
    /// in the audio callback
    pub fn split(self) -> (SequencerPump, SynthPump) {
        (self.sequencer, self.synth)
    }
}

/// Tick-rate half of the engine: sequencer, interpreter, and effects
#[derive(Debug)]
pub struct SequencerPump {
    tracker: Tracker,
    bank: Arc<OscillatorBank>,
    last_update: Option<u32>,
}

impl SequencerPump {
    /// Rate-limited tick pump. Call frequently with a monotonic
    /// millisecond clock; a tick runs only when `TICK_INTERVAL_MS` has
    /// elapsed since the last one. Late invocations run a single tick
    /// and let time slip — missed ticks are never caught up.
    pub fn advance_sequencer(&mut self, now_ms: u32) {
        if let Some(last) = self.last_update {
            if now_ms.wrapping_sub(last) < TICK_INTERVAL_MS {
                return;
            }
        }
        self.last_update = Some(now_ms);

        self.tracker.tick();
        self.bank.publish(self.tracker.osc_params());
    }

    /// Whether the transport is still playing
    pub fn is_playing(&self) -> bool {
        self.tracker.is_playing()
    }

    /// Observe and decrement an indicator line pulse
    pub fn indicator_ticks_remaining(&mut self, line: usize) -> u8 {
        self.tracker.indicator_ticks_remaining(line)
    }

    /// Tick-domain tracker, for metering and tests
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }
}

/// Sample-rate half of the engine: waveform synthesis into the buffer
#[derive(Debug)]
pub struct SynthPump {
    synth: Synth,
    buffer: Arc<FrameBuffer>,
}

impl SynthPump {
    /// Produce exactly one stereo frame into the output buffer. Bounded,
    /// allocation-free, and never blocks on the tick domain; intended to
    /// be called once per frame from the real-time audio callback.
    pub fn produce_sample(&mut self) -> u16 {
        let sample = self.synth.render_sample();
        self.buffer.write_frame(sample);
        sample
    }

    /// Handle to the output buffer for the draining transport
    pub fn output_buffer(&self) -> Arc<FrameBuffer> {
        Arc::clone(&self.buffer)
    }
}
