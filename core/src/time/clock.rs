use log::debug;

use crate::time::{Frames, MusicalPosition, SampleRate, Signature, Tempo, TicksTime, TimeInfo};

pub const DEFAULT_SAMPLE_RATE: SampleRate = 44100;
pub const DEFAULT_TEMPO: f64 = 120.0;
pub const DEFAULT_SIGNATURE_NUM_BEATS: u16 = 4;
pub const DEFAULT_SIGNATURE_NOTE_VALUE: u16 = 4;

/// Tempo map and sample clock of a single render pass.
///
/// Holds the tempo and meter currently in effect and the absolute frame
/// position. Every mutation takes effect on the next conversion or query,
/// never retroactively.
#[derive(Debug, Clone)]
pub struct AudioClock {
  sample_rate: SampleRate,
  tempo: Tempo,
  signature: Signature,

  current_frame: Frames,
  playing: bool,
  transport_changed: bool,
}

impl AudioClock {
  pub fn new(sample_rate: SampleRate) -> AudioClock {
    AudioClock {
      sample_rate,
      tempo: Tempo::new(DEFAULT_TEMPO),
      signature: Signature::new(DEFAULT_SIGNATURE_NUM_BEATS, DEFAULT_SIGNATURE_NOTE_VALUE),
      current_frame: 0,
      playing: false,
      transport_changed: false,
    }
  }

  pub fn with_tempo(self, tempo: Tempo) -> AudioClock {
    AudioClock { tempo, ..self }
  }

  pub fn with_signature(self, signature: Signature) -> AudioClock {
    AudioClock { signature, ..self }
  }

  pub fn get_sample_rate(&self) -> SampleRate {
    self.sample_rate
  }

  pub fn set_tempo(&mut self, tempo: Tempo) {
    debug!("Tempo set to {:.3} BPM", tempo.get_value());
    self.tempo = tempo;
  }

  pub fn get_tempo(&self) -> Tempo {
    self.tempo
  }

  pub fn set_beats_per_measure(&mut self, num_beats: u16) {
    self.signature = Signature::new(num_beats, self.signature.get_note_value());
  }

  pub fn set_note_value(&mut self, note_value: u16) {
    self.signature = Signature::new(self.signature.get_num_beats(), note_value);
  }

  pub fn set_signature(&mut self, signature: Signature) {
    debug!(
      "Time signature set to {}/{}",
      signature.get_num_beats(),
      signature.get_note_value()
    );
    self.signature = signature;
  }

  pub fn get_signature(&self) -> Signature {
    self.signature
  }

  pub fn get_current_frame(&self) -> Frames {
    self.current_frame
  }

  pub fn is_playing(&self) -> bool {
    self.playing
  }

  pub fn is_transport_changed(&self) -> bool {
    self.transport_changed
  }

  /// Sample frames per tick for the tempo currently in effect.
  pub fn frames_per_tick(&self, ticks_per_quarter: u16) -> f64 {
    TicksTime::frames_per_tick(ticks_per_quarter, self.tempo, self.sample_rate)
  }

  /// Moves the clock forward by one block.
  ///
  /// The transport-changed flag is raised only while starting, i.e. on the
  /// very first block.
  pub fn advance(&mut self, block_size: Frames) {
    if self.current_frame == 0 || !self.playing {
      self.transport_changed = true;
      self.playing = true;
    } else {
      self.transport_changed = false;
    }

    self.current_frame += block_size;
  }

  /// Musical position in quarter notes, starting at 1.0.
  pub fn ppq_position(&self) -> f64 {
    let samples_per_beat = self.tempo.samples_per_beat(f64::from(self.sample_rate));
    self.current_frame as f64 / samples_per_beat + 1.0
  }

  /// Musical position of the start of the bar containing `ppq`.
  pub fn bar_start_position(&self, ppq: f64) -> f64 {
    let beats_per_measure = f64::from(self.signature.get_num_beats());
    (ppq / beats_per_measure).floor() * beats_per_measure + 1.0
  }

  pub fn position(&self) -> MusicalPosition {
    MusicalPosition::new(self.ppq_position(), self.signature)
  }

  pub fn time_info(&self) -> TimeInfo {
    let ppq_position = self.ppq_position();
    TimeInfo {
      sample_position: self.current_frame,
      sample_rate: self.sample_rate,
      tempo: self.tempo,
      ppq_position,
      bar_start_position: self.bar_start_position(ppq_position),
      signature: self.signature,
      playing: self.playing,
      transport_changed: self.transport_changed,
    }
  }
}
