//! An instrument that records what it is given and renders constant levels.

use crate::audio::SampleBuffer;
use crate::instrument::{ChannelLayout, Instrument, InstrumentEvent, InstrumentResult};
use crate::time::{Frames, SampleRate, TimeInfo};

pub struct RecordingInstrument {
  levels: Vec<f32>,
  latency: Frames,
  pub configured: Option<(SampleRate, usize, ChannelLayout)>,
  pub started: bool,
  pub stopped: bool,
  /// Events of every delivery, one entry per rendered block
  pub deliveries: Vec<Vec<InstrumentEvent>>,
  pub times: Vec<TimeInfo>,
  pending: Vec<InstrumentEvent>,
}

impl RecordingInstrument {
  /// Channel `n` renders `levels[n]`; channels without a level render silence.
  pub fn new(levels: Vec<f32>) -> RecordingInstrument {
    RecordingInstrument {
      levels,
      latency: 0,
      configured: None,
      started: false,
      stopped: false,
      deliveries: Vec::new(),
      times: Vec::new(),
      pending: Vec::new(),
    }
  }

  pub fn with_latency(self, latency: Frames) -> RecordingInstrument {
    RecordingInstrument { latency, ..self }
  }

  pub fn events(&self) -> Vec<InstrumentEvent> {
    self.deliveries.iter().flatten().cloned().collect()
  }
}

impl Instrument for RecordingInstrument {
  fn name(&self) -> &str {
    "recording"
  }

  fn configure(
    &mut self,
    sample_rate: SampleRate,
    block_size: usize,
    layout: ChannelLayout,
  ) -> InstrumentResult<()> {
    self.configured = Some((sample_rate, block_size, layout));
    Ok(())
  }

  fn start(&mut self) {
    self.started = true;
  }

  fn stop(&mut self) {
    self.stopped = true;
  }

  fn deliver_events(&mut self, events: &[InstrumentEvent]) {
    self.pending.extend_from_slice(events);
  }

  fn render_block(&mut self, time: &TimeInfo, output: &mut SampleBuffer) {
    self.deliveries.push(std::mem::replace(&mut self.pending, Vec::new()));
    self.times.push(*time);
    for (index, channel) in output.iter_channels_mut().enumerate() {
      let level = self.levels.get(index).cloned().unwrap_or(0.0);
      for sample in channel.iter_mut() {
        *sample = level;
      }
    }
  }

  fn latency(&self) -> Frames {
    self.latency
  }
}
