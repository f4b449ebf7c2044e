use crate::time::{Frames, SampleRate, Tempo};

/// Musical time in sequence-file ticks
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub struct TicksTime(u64);

impl TicksTime {
  pub fn new(ticks: u64) -> TicksTime {
    TicksTime(ticks)
  }

  /// Number of sample frames elapsed per tick for a given resolution and tempo.
  pub fn frames_per_tick(ticks_per_quarter: u16, tempo: Tempo, sample_rate: SampleRate) -> f64 {
    let ticks_per_second = f64::from(ticks_per_quarter) * tempo.beats_per_second();
    f64::from(sample_rate) / ticks_per_second
  }

  /// Converts to sample frames, truncating any fractional frame.
  pub fn to_frames(&self, frames_per_tick: f64) -> Frames {
    (self.0 as f64 * frames_per_tick) as Frames
  }
}

impl From<u32> for TicksTime {
  fn from(item: u32) -> Self {
    TicksTime::new(u64::from(item))
  }
}
