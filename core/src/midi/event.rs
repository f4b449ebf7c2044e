use crate::midi::messages::MessageKind;
use crate::midi::types::U4;
use crate::time::Frames;

pub const META: u8 = 0xff;
pub const SYSEX_START: u8 = 0xf0;
pub const SYSEX_ESCAPE: u8 = 0xf7;

/// Recognized meta event subtypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaKind {
  SequenceNumber,
  Text,
  Copyright,
  TrackName,
  InstrumentName,
  Lyric,
  Marker,
  CuePoint,
  ChannelPrefix,
  EndOfTrack,
  SetTempo,
  SmpteOffset,
  TimeSignature,
  KeySignature,
  SequencerSpecific,
}

impl MetaKind {
  pub fn from_byte(byte: u8) -> Option<MetaKind> {
    match byte {
      0x00 => Some(MetaKind::SequenceNumber),
      0x01 => Some(MetaKind::Text),
      0x02 => Some(MetaKind::Copyright),
      0x03 => Some(MetaKind::TrackName),
      0x04 => Some(MetaKind::InstrumentName),
      0x05 => Some(MetaKind::Lyric),
      0x06 => Some(MetaKind::Marker),
      0x07 => Some(MetaKind::CuePoint),
      0x20 => Some(MetaKind::ChannelPrefix),
      0x2f => Some(MetaKind::EndOfTrack),
      0x51 => Some(MetaKind::SetTempo),
      0x54 => Some(MetaKind::SmpteOffset),
      0x58 => Some(MetaKind::TimeSignature),
      0x59 => Some(MetaKind::KeySignature),
      0x7f => Some(MetaKind::SequencerSpecific),
      _ => None,
    }
  }

  /// Meta events that take part in playback scheduling
  pub fn is_playback(&self) -> bool {
    match self {
      MetaKind::SetTempo | MetaKind::TimeSignature | MetaKind::EndOfTrack => true,
      _ => false,
    }
  }
}

/// Location of an event payload inside its track's data buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DataRef {
  offset: usize,
  len: usize,
}

impl DataRef {
  pub fn new(offset: usize, len: usize) -> DataRef {
    DataRef { offset, len }
  }

  pub fn empty() -> DataRef {
    DataRef::default()
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn resolve<'a>(&self, data: &'a [u8]) -> &'a [u8] {
    data.get(self.offset..self.offset + self.len).unwrap_or(&[])
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMessage {
  pub kind: MessageKind,
  pub channel: U4,
  pub status: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
  Meta(MetaKind),
  Channel(ChannelMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
  /// Absolute position in sample frames
  pub timestamp: Frames,
  /// Offset from the start of the block window the event was extracted into
  pub delta: Frames,
  pub kind: EventKind,
  pub data: DataRef,
}

impl Event {
  pub fn meta(timestamp: Frames, kind: MetaKind, data: DataRef) -> Event {
    Event {
      timestamp,
      delta: 0,
      kind: EventKind::Meta(kind),
      data,
    }
  }

  pub fn channel(timestamp: Frames, message: ChannelMessage, data: DataRef) -> Event {
    Event {
      timestamp,
      delta: 0,
      kind: EventKind::Channel(message),
      data,
    }
  }

  pub fn meta_kind(&self) -> Option<MetaKind> {
    match self.kind {
      EventKind::Meta(kind) => Some(kind),
      EventKind::Channel(_) => None,
    }
  }

  pub fn channel_message(&self) -> Option<&ChannelMessage> {
    match &self.kind {
      EventKind::Channel(message) => Some(message),
      EventKind::Meta(_) => None,
    }
  }

  /// Whether the event belongs to a track's playback sequence
  pub fn is_playback(&self) -> bool {
    match &self.kind {
      EventKind::Meta(kind) => kind.is_playback(),
      EventKind::Channel(_) => true,
    }
  }
}
