use std::fmt;

use crate::time::{Frames, SampleRate, Signature, Tempo};

/// Transport snapshot handed to the instrument once per block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeInfo {
  pub sample_position: Frames,
  pub sample_rate: SampleRate,
  pub tempo: Tempo,
  pub ppq_position: f64,
  pub bar_start_position: f64,
  pub signature: Signature,
  pub playing: bool,
  pub transport_changed: bool,
}

/// A PPQ position broken down into bars and beats of a signature
#[derive(PartialEq)]
pub struct MusicalPosition {
  bars: u64,
  beats: u16,
  hundredths: u16,
}

impl MusicalPosition {
  pub fn new(ppq_position: f64, signature: Signature) -> MusicalPosition {
    let quarters = (ppq_position - 1.0).max(0.0);
    let total_beats = quarters * f64::from(signature.get_note_value()) / 4.0;
    let num_beats = u64::from(signature.get_num_beats().max(1));
    let whole_beats = total_beats.floor() as u64;
    MusicalPosition {
      bars: whole_beats / num_beats,
      beats: (whole_beats % num_beats) as u16,
      hundredths: ((total_beats - total_beats.floor()) * 100.0) as u16,
    }
  }

  pub fn get_bars(&self) -> u64 {
    self.bars
  }

  pub fn get_beats(&self) -> u16 {
    self.beats
  }

  pub fn get_hundredths(&self) -> u16 {
    self.hundredths
  }
}

impl fmt::Debug for MusicalPosition {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(
      f,
      "{:05}:{:02}:{:02}",
      self.bars + 1,
      self.beats + 1,
      self.hundredths
    )
  }
}
