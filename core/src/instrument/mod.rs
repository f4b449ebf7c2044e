use std::collections::HashMap;

use failure::Fail;
use log::{info, warn};

use crate::audio::SampleBuffer;
use crate::config::InstrumentConfig;
use crate::midi::{Event, Message};
use crate::time::{Frames, SampleRate, TimeInfo};

pub mod sine;
pub use sine::SineInstrument;

#[cfg(test)]
pub mod recording;

pub const MAX_CHANNELS: usize = 8;

#[derive(Debug, Fail)]
pub enum InstrumentError {
  #[fail(display = "Instrument not found: {}", name)]
  NotFound { name: String },

  #[fail(display = "Failed to configure the instrument: {}", cause)]
  Configure { cause: String },
}

pub type InstrumentResult<T> = Result<T, InstrumentError>;

/// Speaker arrangement of the instrument output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
  Mono,
  Stereo,
  Lcr,
  Quadraphonic,
  Surround50,
  Surround51,
  Surround61,
  Surround71,
}

impl ChannelLayout {
  /// Layout for a channel count; counts above 8 are clamped to 8.
  pub fn from_channels(channels: usize) -> ChannelLayout {
    match channels {
      0 => {
        warn!("No output channels requested, using mono");
        ChannelLayout::Mono
      }
      1 => ChannelLayout::Mono,
      2 => ChannelLayout::Stereo,
      3 => ChannelLayout::Lcr,
      4 => ChannelLayout::Quadraphonic,
      5 => ChannelLayout::Surround50,
      6 => ChannelLayout::Surround51,
      7 => ChannelLayout::Surround61,
      _ => {
        if channels > MAX_CHANNELS {
          warn!(
            "{} output channels requested, clamping to {}",
            channels, MAX_CHANNELS
          );
        }
        ChannelLayout::Surround71
      }
    }
  }

  pub fn channels(&self) -> usize {
    match self {
      ChannelLayout::Mono => 1,
      ChannelLayout::Stereo => 2,
      ChannelLayout::Lcr => 3,
      ChannelLayout::Quadraphonic => 4,
      ChannelLayout::Surround50 => 5,
      ChannelLayout::Surround51 => 6,
      ChannelLayout::Surround61 => 7,
      ChannelLayout::Surround71 => 8,
    }
  }
}

/// A channel message as delivered to an instrument: its offset inside the
/// block plus the raw status and data bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstrumentEvent {
  pub delta: Frames,
  len: usize,
  bytes: [u8; 3],
}

impl InstrumentEvent {
  pub fn new(delta: Frames, raw: &[u8]) -> InstrumentEvent {
    let len = raw.len().min(3);
    let mut bytes = [0u8; 3];
    bytes[..len].copy_from_slice(&raw[..len]);
    InstrumentEvent { delta, len, bytes }
  }

  /// Builds the instrument view of a scheduled event; meta events have none.
  pub fn from_event(event: &Event, payload: &[u8]) -> Option<InstrumentEvent> {
    event.channel_message().map(|message| {
      let len = 1 + payload.len().min(2);
      let mut bytes = [message.status, 0, 0];
      bytes[1..len].copy_from_slice(&payload[..len - 1]);
      InstrumentEvent {
        delta: event.delta,
        len,
        bytes,
      }
    })
  }

  pub fn bytes(&self) -> &[u8] {
    &self.bytes[..self.len]
  }

  pub fn message(&self) -> Option<Message> {
    Message::decode(self.bytes())
  }
}

/// The synthesis collaborator driven by the render loop.
///
/// Instruments keep their state across blocks and are never reset while
/// rendering.
pub trait Instrument {
  fn name(&self) -> &str;

  fn configure(
    &mut self,
    sample_rate: SampleRate,
    block_size: usize,
    layout: ChannelLayout,
  ) -> InstrumentResult<()>;

  fn start(&mut self);

  fn stop(&mut self);

  /// Events for the next rendered block, ordered by delta.
  fn deliver_events(&mut self, events: &[InstrumentEvent]);

  fn render_block(&mut self, time: &TimeInfo, output: &mut SampleBuffer);

  fn latency(&self) -> Frames;
}

type InstrumentFactory = Box<dyn Fn(&InstrumentConfig) -> InstrumentResult<Box<dyn Instrument>>>;

pub struct Instruments {
  factories: HashMap<String, InstrumentFactory>,
}

impl Instruments {
  pub fn new() -> Instruments {
    let mut factories: HashMap<String, InstrumentFactory> = HashMap::new();

    let sine_factory: InstrumentFactory = Box::new(|config: &InstrumentConfig| {
      Ok(Box::new(SineInstrument::new(config.gain, config.release_frames)) as Box<dyn Instrument>)
    });
    factories.insert(sine::ID.to_string(), sine_factory);

    Instruments { factories }
  }

  pub fn register<T, F>(&mut self, id: T, factory: F)
  where
    T: Into<String>,
    F: Fn(&InstrumentConfig) -> InstrumentResult<Box<dyn Instrument>> + 'static,
  {
    self.factories.insert(id.into(), Box::new(factory));
  }

  pub fn ids(&self) -> Vec<&str> {
    let mut ids: Vec<&str> = self.factories.keys().map(|id| id.as_str()).collect();
    ids.sort();
    ids
  }

  pub fn instrument<T>(&self, id: T, config: &InstrumentConfig) -> InstrumentResult<Box<dyn Instrument>>
  where
    T: Into<String>,
  {
    let name = id.into();
    let instrument = self
      .factories
      .get(&name)
      .map(|factory| factory(config))
      .unwrap_or_else(|| Err(InstrumentError::NotFound { name: name.clone() }))?;
    info!("Loaded instrument {}", instrument.name());
    Ok(instrument)
  }
}

impl Default for Instruments {
  fn default() -> Instruments {
    Instruments::new()
  }
}

#[cfg(test)]
mod test {
  use super::recording::RecordingInstrument;
  use super::{ChannelLayout, Instrument, InstrumentError, InstrumentEvent, Instruments};
  use crate::config::InstrumentConfig;
  use crate::midi::{ChannelMessage, DataRef, Event, Message, MessageKind, MetaKind};

  #[test]
  pub fn layout_from_channels() {
    assert_eq!(ChannelLayout::from_channels(1), ChannelLayout::Mono);
    assert_eq!(ChannelLayout::from_channels(2), ChannelLayout::Stereo);
    assert_eq!(ChannelLayout::from_channels(6), ChannelLayout::Surround51);
    assert_eq!(ChannelLayout::from_channels(8).channels(), 8);
    assert_eq!(ChannelLayout::from_channels(12), ChannelLayout::Surround71);
    assert_eq!(ChannelLayout::from_channels(0).channels(), 1);
  }

  #[test]
  pub fn instrument_event_from_channel_message() {
    let message = ChannelMessage {
      kind: MessageKind::NoteOn,
      channel: 2,
      status: 0x92,
    };
    let mut event = Event::channel(1000, message, DataRef::new(0, 2));
    event.delta = 17;
    let instrument_event = InstrumentEvent::from_event(&event, &[64, 90]).unwrap();
    assert_eq!(instrument_event.delta, 17);
    assert_eq!(instrument_event.bytes(), &[0x92u8, 64, 90][..]);
    assert_eq!(
      instrument_event.message(),
      Some(Message::NoteOn {
        channel: 2,
        key: 64,
        velocity: 90
      })
    );
  }

  #[test]
  pub fn instrument_event_skips_meta() {
    let event = Event::meta(0, MetaKind::SetTempo, DataRef::new(0, 3));
    assert_eq!(InstrumentEvent::from_event(&event, &[7, 0xa1, 0x20]), None);
  }

  #[test]
  pub fn registry_has_sine() {
    let instruments = Instruments::new();
    assert_eq!(instruments.ids(), vec!["sine"]);
    let instrument = instruments
      .instrument("sine", &InstrumentConfig::default())
      .unwrap();
    assert_eq!(instrument.name(), "sine");
  }

  #[test]
  pub fn registry_not_found() {
    let instruments = Instruments::new();
    match instruments.instrument("organ", &InstrumentConfig::default()) {
      Err(InstrumentError::NotFound { name }) => assert_eq!(name, "organ"),
      Err(err) => panic!("unexpected error {}", err),
      Ok(_) => panic!("unexpected instrument"),
    }
  }

  #[test]
  pub fn registry_register() {
    let mut instruments = Instruments::new();
    instruments.register("recording", |_config: &InstrumentConfig| {
      Ok(Box::new(RecordingInstrument::new(vec![0.5])) as Box<dyn Instrument>)
    });
    assert_eq!(instruments.ids(), vec!["recording", "sine"]);
    let instrument = instruments
      .instrument("recording", &InstrumentConfig::default())
      .unwrap();
    assert_eq!(instrument.name(), "recording");
  }
}
