//! Builders for sequence-file byte images used across the test suites.

use crate::midi::bytes::write_variable_length;

pub struct TrackBuilder {
  body: Vec<u8>,
}

impl TrackBuilder {
  pub fn new() -> TrackBuilder {
    TrackBuilder { body: Vec::new() }
  }

  pub fn message(mut self, delta: u32, bytes: &[u8]) -> Self {
    write_variable_length(delta, &mut self.body);
    self.body.extend_from_slice(bytes);
    self
  }

  pub fn note_on(self, delta: u32, channel: u8, key: u8, velocity: u8) -> Self {
    self.message(delta, &[0x90 | channel, key, velocity])
  }

  pub fn note_off(self, delta: u32, channel: u8, key: u8, velocity: u8) -> Self {
    self.message(delta, &[0x80 | channel, key, velocity])
  }

  pub fn meta(mut self, delta: u32, meta_type: u8, payload: &[u8]) -> Self {
    write_variable_length(delta, &mut self.body);
    self.body.extend_from_slice(&[0xff, meta_type, payload.len() as u8]);
    self.body.extend_from_slice(payload);
    self
  }

  pub fn tempo(self, delta: u32, micros_per_beat: u32) -> Self {
    let bytes = micros_per_beat.to_be_bytes();
    self.meta(delta, 0x51, &bytes[1..])
  }

  pub fn time_signature(self, delta: u32, num_beats: u8, note_value_pow: u8) -> Self {
    self.meta(delta, 0x58, &[num_beats, note_value_pow, 24, 8])
  }

  pub fn end_of_track(self, delta: u32) -> Self {
    self.meta(delta, 0x2f, &[])
  }

  pub fn sysex(mut self, delta: u32, payload: &[u8]) -> Self {
    write_variable_length(delta, &mut self.body);
    self.body.extend_from_slice(&[0xf0, payload.len() as u8]);
    self.body.extend_from_slice(payload);
    self
  }

  pub fn raw(mut self, bytes: &[u8]) -> Self {
    self.body.extend_from_slice(bytes);
    self
  }

  pub fn body(&self) -> &[u8] {
    &self.body
  }
}

pub struct SequenceBuilder {
  format: u16,
  time_division: u16,
  tracks: Vec<Vec<u8>>,
}

impl SequenceBuilder {
  pub fn new(format: u16, time_division: u16) -> SequenceBuilder {
    SequenceBuilder {
      format,
      time_division,
      tracks: Vec::new(),
    }
  }

  pub fn track(mut self, track: TrackBuilder) -> Self {
    self.tracks.push(track.body);
    self
  }

  pub fn build(&self) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"MThd");
    out.extend_from_slice(&6u32.to_be_bytes());
    out.extend_from_slice(&self.format.to_be_bytes());
    out.extend_from_slice(&(self.tracks.len() as u16).to_be_bytes());
    out.extend_from_slice(&self.time_division.to_be_bytes());
    for body in self.tracks.iter() {
      out.extend_from_slice(b"MTrk");
      out.extend_from_slice(&(body.len() as u32).to_be_bytes());
      out.extend_from_slice(body);
    }
    out
  }
}

/// A format-0 file: one note-on, the note-off 480 ticks later, end of track.
pub fn single_note(time_division: u16) -> Vec<u8> {
  SequenceBuilder::new(0, time_division)
    .track(
      TrackBuilder::new()
        .note_on(0, 0, 60, 100)
        .note_off(480, 0, 60, 0)
        .end_of_track(0),
    )
    .build()
}
