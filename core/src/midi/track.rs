use std::collections::VecDeque;

use crate::midi::event::{ChannelMessage, DataRef, Event, MetaKind};
use crate::time::Frames;

/// A decoded track.
///
/// Event payloads live in one contiguous buffer owned by the track; events
/// refer to it through `DataRef`s.
#[derive(Debug, Clone)]
pub struct Track {
  index: usize,
  events: Vec<Event>,
  data: Vec<u8>,
  sequence: VecDeque<Event>,
  skipped_messages: usize,
}

impl Track {
  pub fn new(index: usize) -> Track {
    Track {
      index,
      events: Vec::new(),
      data: Vec::new(),
      sequence: VecDeque::new(),
      skipped_messages: 0,
    }
  }

  pub(crate) fn push_meta(&mut self, timestamp: Frames, kind: MetaKind, payload: &[u8]) {
    let data = self.store(payload);
    self.events.push(Event::meta(timestamp, kind, data));
  }

  pub(crate) fn push_message(&mut self, timestamp: Frames, message: ChannelMessage, data: &[u8]) {
    let data = self.store(data);
    self.events.push(Event::channel(timestamp, message, data));
  }

  pub(crate) fn skip_message(&mut self) {
    self.skipped_messages += 1;
  }

  /// Seals the track and builds its playback sequence.
  pub(crate) fn finish(mut self) -> Track {
    self.data.shrink_to_fit();
    self.sequence = self
      .events
      .iter()
      .filter(|event| event.is_playback())
      .cloned()
      .collect();
    self
  }

  fn store(&mut self, payload: &[u8]) -> DataRef {
    if payload.is_empty() {
      DataRef::empty()
    } else {
      let offset = self.data.len();
      self.data.extend_from_slice(payload);
      DataRef::new(offset, payload.len())
    }
  }

  pub fn index(&self) -> usize {
    self.index
  }

  /// Every materialized event, in file order
  pub fn events(&self) -> &[Event] {
    &self.events
  }

  /// Tempo, meter and end-of-track meta events plus every channel message, in file order
  pub fn sequence(&self) -> &VecDeque<Event> {
    &self.sequence
  }

  pub fn data(&self) -> &[u8] {
    &self.data
  }

  pub fn payload(&self, event: &Event) -> &[u8] {
    event.data.resolve(&self.data)
  }

  /// Channel messages dropped because their status could not be classified
  pub fn skipped_messages(&self) -> usize {
    self.skipped_messages
  }

  /// Timestamp of the last event
  pub fn duration(&self) -> Frames {
    self.events.last().map(|event| event.timestamp).unwrap_or(0)
  }

  pub fn name(&self) -> Option<String> {
    self
      .events
      .iter()
      .find(|event| event.meta_kind() == Some(MetaKind::TrackName))
      .map(|event| String::from_utf8_lossy(self.payload(event)).into_owned())
  }
}
