use crate::midi::types::{U14, U4, U7};

const ALL_SOUND_OFF: U7 = 0x78;
const RESET_ALL_CONTROLLERS: U7 = 0x79;
const LOCAL_CONTROL: U7 = 0x7a;
const ALL_NOTES_OFF: U7 = 0x7b;
const OMNI_MODE_OFF: U7 = 0x7c;
const OMNI_MODE_ON: U7 = 0x7d;
const MONO_MODE_ON: U7 = 0x7e;
const POLY_MODE_ON: U7 = 0x7f;

/// Kind of a channel message, refined into the channel-mode kinds for
/// control changes on the reserved controllers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
  NoteOff,
  NoteOn,
  PolyphonicKeyPressure,
  ControlChange,
  ProgramChange,
  ChannelPressure,
  PitchBend,
  AllSoundOff,
  ResetAllControllers,
  LocalControl,
  AllNotesOff,
  OmniModeOff,
  OmniModeOn,
  MonoModeOn,
  PolyModeOn,
}

impl MessageKind {
  /// Classifies a status byte, using the first data byte to refine control changes.
  /// Returns `None` when the high nibble is not a channel voice status.
  pub fn classify(status: u8, first_data: U7) -> Option<MessageKind> {
    match (status >> 4) & 0x0f {
      0b1000 => Some(MessageKind::NoteOff),
      0b1001 => Some(MessageKind::NoteOn),
      0b1010 => Some(MessageKind::PolyphonicKeyPressure),
      0b1011 => Some(match first_data {
        ALL_SOUND_OFF => MessageKind::AllSoundOff,
        RESET_ALL_CONTROLLERS => MessageKind::ResetAllControllers,
        LOCAL_CONTROL => MessageKind::LocalControl,
        ALL_NOTES_OFF => MessageKind::AllNotesOff,
        OMNI_MODE_OFF => MessageKind::OmniModeOff,
        OMNI_MODE_ON => MessageKind::OmniModeOn,
        MONO_MODE_ON => MessageKind::MonoModeOn,
        POLY_MODE_ON => MessageKind::PolyModeOn,
        _ => MessageKind::ControlChange,
      }),
      0b1100 => Some(MessageKind::ProgramChange),
      0b1101 => Some(MessageKind::ChannelPressure),
      0b1110 => Some(MessageKind::PitchBend),
      _ => None,
    }
  }

  /// Number of data bytes following the status byte
  pub fn data_len(&self) -> usize {
    match self {
      MessageKind::ProgramChange | MessageKind::ChannelPressure => 1,
      _ => 2,
    }
  }
}

/// Typed view over a raw channel message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
  NoteOff { channel: U4, key: U7, velocity: U7 },
  NoteOn { channel: U4, key: U7, velocity: U7 },
  PolyphonicKeyPressure { channel: U4, key: U7, value: U7 },
  ControlChange { channel: U4, controller: U7, value: U7 },
  ProgramChange { channel: U4, value: U7 },
  ChannelPressure { channel: U4, value: U7 },
  PitchBend { channel: U4, value: U14 },
  AllSoundOff { channel: U4 },
  ResetAllControllers { channel: U4 },
  LocalControl { channel: U4, on: bool },
  AllNotesOff { channel: U4 },
  OmniModeOff { channel: U4 },
  OmniModeOn { channel: U4 },
  MonoModeOn { channel: U4, num_channels: U7 },
  PolyModeOn { channel: U4 },
}

impl Message {
  /// Decodes a status byte followed by its data bytes.
  /// A note-on with zero velocity is reported as a note-off.
  pub fn decode(raw: &[u8]) -> Option<Message> {
    let status = *raw.get(0)?;
    let d1 = *raw.get(1)? & 0x7f;
    let kind = MessageKind::classify(status, d1)?;
    let channel = status & 0x0f;
    if kind.data_len() == 1 {
      return match kind {
        MessageKind::ProgramChange => Some(Message::ProgramChange { channel, value: d1 }),
        _ => Some(Message::ChannelPressure { channel, value: d1 }),
      };
    }

    let d2 = *raw.get(2)? & 0x7f;
    let message = match kind {
      MessageKind::NoteOff => Message::NoteOff {
        channel,
        key: d1,
        velocity: d2,
      },
      MessageKind::NoteOn if d2 == 0 => Message::NoteOff {
        channel,
        key: d1,
        velocity: 0,
      },
      MessageKind::NoteOn => Message::NoteOn {
        channel,
        key: d1,
        velocity: d2,
      },
      MessageKind::PolyphonicKeyPressure => Message::PolyphonicKeyPressure {
        channel,
        key: d1,
        value: d2,
      },
      MessageKind::ControlChange => Message::ControlChange {
        channel,
        controller: d1,
        value: d2,
      },
      MessageKind::PitchBend => Message::PitchBend {
        channel,
        value: ((d2 as U14) << 7) | (d1 as U14),
      },
      MessageKind::AllSoundOff => Message::AllSoundOff { channel },
      MessageKind::ResetAllControllers => Message::ResetAllControllers { channel },
      MessageKind::LocalControl => Message::LocalControl {
        channel,
        on: d2 >= 64,
      },
      MessageKind::AllNotesOff => Message::AllNotesOff { channel },
      MessageKind::OmniModeOff => Message::OmniModeOff { channel },
      MessageKind::OmniModeOn => Message::OmniModeOn { channel },
      MessageKind::MonoModeOn => Message::MonoModeOn {
        channel,
        num_channels: d2,
      },
      MessageKind::PolyModeOn => Message::PolyModeOn { channel },
      MessageKind::ProgramChange | MessageKind::ChannelPressure => return None,
    };
    Some(message)
  }

  pub fn channel(&self) -> U4 {
    match *self {
      Message::NoteOff { channel, .. }
      | Message::NoteOn { channel, .. }
      | Message::PolyphonicKeyPressure { channel, .. }
      | Message::ControlChange { channel, .. }
      | Message::ProgramChange { channel, .. }
      | Message::ChannelPressure { channel, .. }
      | Message::PitchBend { channel, .. }
      | Message::AllSoundOff { channel }
      | Message::ResetAllControllers { channel }
      | Message::LocalControl { channel, .. }
      | Message::AllNotesOff { channel }
      | Message::OmniModeOff { channel }
      | Message::OmniModeOn { channel }
      | Message::MonoModeOn { channel, .. }
      | Message::PolyModeOn { channel } => channel,
    }
  }
}
