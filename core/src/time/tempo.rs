const SECONDS_PER_MINUTE: f64 = 60.0;
const MICROS_PER_MINUTE: f64 = 60_000_000.0;

/// Tempo in beats (quarter notes) per minute
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Tempo(f64);

impl Tempo {
  pub fn new(value: f64) -> Tempo {
    Tempo(value)
  }

  /// Tempo from the microseconds-per-beat value carried by a set-tempo meta event.
  /// Returns `None` for a zero duration.
  pub fn from_micros_per_beat(micros_per_beat: u32) -> Option<Tempo> {
    if micros_per_beat == 0 {
      None
    } else {
      Some(Tempo(MICROS_PER_MINUTE / f64::from(micros_per_beat)))
    }
  }

  pub fn get_value(&self) -> f64 {
    self.0
  }

  pub fn beats_per_second(&self) -> f64 {
    self.0 / SECONDS_PER_MINUTE
  }

  pub fn samples_per_beat(&self, sample_rate: f64) -> f64 {
    (SECONDS_PER_MINUTE / self.0) * sample_rate
  }
}

impl From<Tempo> for f64 {
  fn from(item: Tempo) -> Self {
    item.0
  }
}
