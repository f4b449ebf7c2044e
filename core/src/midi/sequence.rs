use crate::midi::track::Track;

/// Sequence file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
  pub format: u16,
  pub track_count: u16,
  /// Ticks per quarter note
  pub time_division: u16,
}

#[derive(Debug, Clone)]
pub struct Sequence {
  header: Header,
  tracks: Vec<Track>,
}

impl Sequence {
  pub fn new(header: Header, tracks: Vec<Track>) -> Sequence {
    Sequence { header, tracks }
  }

  pub fn format(&self) -> u16 {
    self.header.format
  }

  pub fn time_division(&self) -> u16 {
    self.header.time_division
  }

  pub fn tracks(&self) -> &[Track] {
    &self.tracks
  }

  pub fn track(&self, index: usize) -> Option<&Track> {
    self.tracks.get(index)
  }

  pub fn track_count(&self) -> usize {
    self.tracks.len()
  }
}
