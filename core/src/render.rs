use failure::Fail;
use log::{debug, info};

use crate::audio::SampleBuffer;
use crate::config::{ClockConfig, Config, RenderConfig};
use crate::instrument::{ChannelLayout, Instrument, InstrumentError, InstrumentEvent};
use crate::midi::{Sequence, SequenceDecoder};
use crate::pcm::{PcmEncoder, PcmError};
use crate::scheduler::{BlockScheduler, ScheduledWindow};
use crate::time::{AudioClock, Frames, Tempo};

#[derive(Debug, Fail)]
pub enum RenderError {
  #[fail(display = "Unsupported sequence: {}", cause)]
  UnsupportedFormat { cause: String },

  #[fail(display = "Invalid render settings: {}", cause)]
  InvalidSettings { cause: String },

  #[fail(display = "Instrument failure: {}", cause)]
  Instrument { cause: InstrumentError },

  #[fail(display = "Unable to open the output stream: {}", cause)]
  Pcm { cause: PcmError },
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Settings and clock of a single render pass.
///
/// The decoder reads the clock, the scheduler moves it.
pub struct RenderContext {
  settings: RenderConfig,
  strict_message_kinds: bool,
  clock: AudioClock,
}

impl RenderContext {
  pub fn new(settings: RenderConfig, clock: &ClockConfig) -> RenderResult<RenderContext> {
    let invalid = |cause: String| Err(RenderError::InvalidSettings { cause });

    if settings.sample_rate == 0 {
      return invalid("the sample rate must be positive".to_string());
    }
    if settings.block_size == 0 {
      return invalid("the block size must be positive".to_string());
    }
    if settings.channels == 0 {
      return invalid("at least one output channel is required".to_string());
    }
    if !(clock.tempo.is_finite() && clock.tempo > 0.0) {
      return invalid(format!("invalid tempo {}", clock.tempo));
    }
    if clock.beats_per_measure == 0 || clock.note_value == 0 {
      return invalid(format!(
        "invalid time signature {}/{}",
        clock.beats_per_measure, clock.note_value
      ));
    }

    let clock = AudioClock::new(settings.sample_rate)
      .with_tempo(clock.tempo())
      .with_signature(clock.signature());

    Ok(RenderContext {
      settings,
      strict_message_kinds: false,
      clock,
    })
  }

  pub fn from_config(config: &Config) -> RenderResult<RenderContext> {
    RenderContext::new(config.render.clone(), &config.clock).map(|context| RenderContext {
      strict_message_kinds: config.decoder.strict_message_kinds,
      ..context
    })
  }

  pub fn settings(&self) -> &RenderConfig {
    &self.settings
  }

  pub fn clock(&self) -> &AudioClock {
    &self.clock
  }

  /// A decoder converting ticks with the clock's current tempo.
  pub fn decoder(&self) -> SequenceDecoder {
    SequenceDecoder::new(&self.clock).strict(self.strict_message_kinds)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderStats {
  pub blocks_rendered: usize,
  pub non_empty_windows: usize,
  pub events_delivered: usize,
  pub meta_events_applied: usize,
  pub expired_events: usize,
  pub latency: Frames,
  pub final_tempo: Tempo,
}

pub struct RenderOutput {
  pub bytes: Vec<u8>,
  pub stats: RenderStats,
}

/// Only single-track sequences of format 0 are rendered.
pub fn check_policy(sequence: &Sequence) -> RenderResult<()> {
  if sequence.format() != 0 {
    return Err(RenderError::UnsupportedFormat {
      cause: format!("format {} (only format 0 is supported)", sequence.format()),
    });
  }
  if sequence.track_count() != 1 {
    return Err(RenderError::UnsupportedFormat {
      cause: format!(
        "{} tracks (exactly one is supported)",
        sequence.track_count()
      ),
    });
  }
  Ok(())
}

pub struct Renderer {
  context: RenderContext,
}

impl Renderer {
  pub fn new(context: RenderContext) -> Renderer {
    Renderer { context }
  }

  pub fn context(&self) -> &RenderContext {
    &self.context
  }

  /// Renders the sequence block by block until its events run out or an
  /// end-of-track event is reached, then renders the configured tail.
  pub fn render(
    &mut self,
    sequence: &Sequence,
    instrument: &mut dyn Instrument,
  ) -> RenderResult<RenderOutput> {
    check_policy(sequence)?;
    let track = sequence
      .tracks()
      .first()
      .ok_or_else(|| RenderError::UnsupportedFormat {
        cause: "the sequence has no tracks".to_string(),
      })?;

    let settings = self.context.settings.clone();
    let layout = ChannelLayout::from_channels(usize::from(settings.channels));
    let channels = layout.channels();

    let mut encoder = PcmEncoder::open(channels as u16, settings.sample_rate, settings.bit_depth)
      .map_err(|cause| RenderError::Pcm { cause })?;

    instrument
      .configure(settings.sample_rate, settings.block_size, layout)
      .map_err(|cause| RenderError::Instrument { cause })?;
    let latency = instrument.latency();
    instrument.start();

    info!(
      "Rendering {} event(s) with {} at {} Hz, {} frames per block, {} channel(s), {}",
      track.sequence().len(),
      instrument.name(),
      settings.sample_rate,
      settings.block_size,
      channels,
      settings.bit_depth
    );

    let mut buffer = SampleBuffer::new(channels, settings.block_size);
    let mut scheduler = BlockScheduler::new(track, settings.block_size as Frames);
    let clock = &mut self.context.clock;

    let mut stats = RenderStats {
      blocks_rendered: 0,
      non_empty_windows: 0,
      events_delivered: 0,
      meta_events_applied: 0,
      expired_events: 0,
      latency,
      final_tempo: clock.get_tempo(),
    };

    loop {
      let window = scheduler.next_window(clock);
      let events = instrument_events(&scheduler, &window);

      if !window.is_empty() {
        stats.non_empty_windows += 1;
      }
      stats.events_delivered += events.len();

      instrument.deliver_events(&events);
      instrument.render_block(&clock.time_info(), &mut buffer);
      encoder.write_block(&buffer);
      clock.advance(settings.block_size as Frames);
      stats.blocks_rendered += 1;

      if window.is_last() {
        debug!(
          "Sequence over at frame {} ({:?})",
          clock.get_current_frame(),
          clock.position()
        );
        break;
      }
    }

    for _ in 0..settings.tail_blocks {
      instrument.deliver_events(&[]);
      instrument.render_block(&clock.time_info(), &mut buffer);
      encoder.write_block(&buffer);
      clock.advance(settings.block_size as Frames);
      stats.blocks_rendered += 1;
    }

    instrument.stop();

    stats.meta_events_applied = scheduler.meta_events_applied();
    stats.expired_events = scheduler.expired_events();
    stats.final_tempo = clock.get_tempo();

    info!(
      "Rendered {} block(s), {} event(s) delivered, {} expired",
      stats.blocks_rendered, stats.events_delivered, stats.expired_events
    );

    Ok(RenderOutput {
      bytes: encoder.finalize(),
      stats,
    })
  }
}

fn instrument_events(scheduler: &BlockScheduler, window: &ScheduledWindow) -> Vec<InstrumentEvent> {
  window
    .events
    .iter()
    .filter_map(|event| InstrumentEvent::from_event(event, scheduler.payload(event)))
    .collect()
}

#[cfg(test)]
mod test {
  use super::{check_policy, RenderContext, RenderError, Renderer};
  use crate::config::{ClockConfig, Config, RenderConfig};
  use crate::instrument::recording::RecordingInstrument;
  use crate::instrument::{ChannelLayout, InstrumentEvent};
  use crate::midi::testing::{single_note, SequenceBuilder, TrackBuilder};
  use crate::pcm::header::HEADER_SIZE;
  use crate::pcm::BitDepth;
  use crate::time::Signature;

  fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(word)
  }

  fn renderer(settings: RenderConfig) -> Renderer {
    Renderer::new(RenderContext::new(settings, &ClockConfig::default()).unwrap())
  }

  #[test]
  pub fn single_note_end_to_end() {
    let mut renderer = renderer(RenderConfig::default());
    let sequence = renderer.context().decoder().decode(&single_note(96)).unwrap();
    let mut instrument = RecordingInstrument::new(vec![0.5, -0.5]);

    let output = renderer.render(&sequence, &mut instrument).unwrap();
    let stats = &output.stats;

    assert_eq!(stats.blocks_rendered, 216);
    assert_eq!(stats.non_empty_windows, 2);
    assert_eq!(stats.events_delivered, 2);
    assert_eq!(stats.meta_events_applied, 1);
    assert_eq!(stats.expired_events, 0);
    assert_eq!(stats.final_tempo.get_value(), 120.0);

    let data_len = 216 * 512 * 2 * 2;
    assert_eq!(output.bytes.len(), HEADER_SIZE + data_len);
    assert_eq!(u32_at(&output.bytes, 40), data_len as u32);
    assert_eq!(u32_at(&output.bytes, 4), data_len as u32 + 36);
    // 0.5 and -0.5 at 16-bit
    assert_eq!(
      &output.bytes[HEADER_SIZE..HEADER_SIZE + 4],
      &[0xff, 0x3f, 0x01, 0xc0][..]
    );

    assert!(instrument.started);
    assert!(instrument.stopped);
    assert_eq!(instrument.configured, Some((44100, 512, ChannelLayout::Stereo)));
    assert_eq!(instrument.deliveries.len(), 216);
    assert_eq!(instrument.events().len(), 2);
    assert_eq!(
      instrument.deliveries[0],
      vec![InstrumentEvent::new(0, &[0x90, 60, 100])]
    );
    assert_eq!(
      instrument.deliveries[215],
      vec![InstrumentEvent::new(110_250 - 215 * 512, &[0x80, 60, 0])]
    );
    assert!(instrument.deliveries[1..215].iter().all(|events| events.is_empty()));
  }

  #[test]
  pub fn time_info_follows_the_clock() {
    let mut renderer = renderer(RenderConfig::default());
    let sequence = renderer.context().decoder().decode(&single_note(96)).unwrap();
    let mut instrument = RecordingInstrument::new(vec![]);
    renderer.render(&sequence, &mut instrument).unwrap();

    assert_eq!(instrument.times[0].sample_position, 0);
    assert_eq!(instrument.times[0].ppq_position, 1.0);
    assert!(instrument.times[1].playing);
    assert!(instrument.times[1].transport_changed);
    assert!(!instrument.times[2].transport_changed);
    assert_eq!(instrument.times[3].sample_position, 3 * 512);
    assert_eq!(renderer.context().clock().get_current_frame(), 216 * 512);
  }

  #[test]
  pub fn tail_blocks_extend_the_render() {
    let mut renderer = renderer(RenderConfig {
      tail_blocks: 4,
      channels: 1,
      bit_depth: BitDepth::Eight,
      ..RenderConfig::default()
    });
    let sequence = renderer.context().decoder().decode(&single_note(96)).unwrap();
    let mut instrument = RecordingInstrument::new(vec![0.0]);
    let output = renderer.render(&sequence, &mut instrument).unwrap();

    assert_eq!(output.stats.blocks_rendered, 220);
    assert_eq!(output.bytes.len(), HEADER_SIZE + 220 * 512);
    assert!(output.bytes[HEADER_SIZE..].iter().all(|byte| *byte == 127));
    assert_eq!(instrument.configured, Some((44100, 512, ChannelLayout::Mono)));
  }

  #[test]
  pub fn tempo_change_applies_from_its_block() {
    let data = SequenceBuilder::new(0, 96)
      .track(
        TrackBuilder::new()
          .tempo(0, 1_000_000)
          .note_on(0, 0, 60, 100)
          .note_off(96, 0, 60, 0),
      )
      .build();
    let mut renderer = renderer(RenderConfig::default());
    let sequence = renderer.context().decoder().decode(&data).unwrap();
    let mut instrument = RecordingInstrument::new(vec![0.0, 0.0]);
    let output = renderer.render(&sequence, &mut instrument).unwrap();

    // Timestamps were fixed at decode time with 120 BPM: note-off at 22050
    assert_eq!(output.stats.blocks_rendered, 44);
    assert_eq!(output.stats.final_tempo.get_value(), 60.0);
    assert_eq!(instrument.times[0].tempo.get_value(), 60.0);
  }

  #[test]
  pub fn time_signature_reaches_the_instrument() {
    let data = SequenceBuilder::new(0, 96)
      .track(
        TrackBuilder::new()
          .time_signature(0, 3, 3)
          .note_on(0, 0, 60, 100)
          .raw(&[0x80, 0x80, 0x80, 0x80, 0x00])
          .raw(&[0x90, 64, 100]),
      )
      .build();
    let mut renderer = renderer(RenderConfig::default());
    let sequence = renderer.context().decoder().decode(&data).unwrap();
    let mut instrument = RecordingInstrument::new(vec![0.0, 0.0]);
    let output = renderer.render(&sequence, &mut instrument).unwrap();

    assert_eq!(output.stats.blocks_rendered, 1);
    assert_eq!(output.stats.meta_events_applied, 1);
    assert_eq!(output.stats.events_delivered, 2);
    assert_eq!(instrument.times[0].signature, Signature::new(3, 8));
    assert_eq!(renderer.context().clock().get_signature(), Signature::new(3, 8));
  }

  #[test]
  pub fn oversized_byte_rate_is_reported() {
    let mut renderer = renderer(RenderConfig {
      sample_rate: u32::max_value(),
      ..RenderConfig::default()
    });
    let data = SequenceBuilder::new(0, 96)
      .track(TrackBuilder::new().end_of_track(0))
      .build();
    let sequence = renderer.context().decoder().decode(&data).unwrap();
    let mut instrument = RecordingInstrument::new(vec![]);
    match renderer.render(&sequence, &mut instrument) {
      Err(RenderError::Pcm { .. }) => {}
      Err(err) => panic!("unexpected error {}", err),
      Ok(_) => panic!("unexpected success"),
    }
    assert!(!instrument.started);
  }

  #[test]
  pub fn stats_carry_instrument_latency() {
    let mut renderer = renderer(RenderConfig::default());
    let sequence = renderer.context().decoder().decode(&single_note(96)).unwrap();
    let mut instrument = RecordingInstrument::new(vec![]).with_latency(64);
    let output = renderer.render(&sequence, &mut instrument).unwrap();
    assert_eq!(output.stats.latency, 64);
  }

  #[test]
  pub fn queue_exhaustion_without_end_of_track() {
    let data = SequenceBuilder::new(0, 96)
      .track(TrackBuilder::new().note_on(0, 0, 60, 100))
      .build();
    let mut renderer = renderer(RenderConfig::default());
    let sequence = renderer.context().decoder().decode(&data).unwrap();
    let mut instrument = RecordingInstrument::new(vec![0.0, 0.0]);
    let output = renderer.render(&sequence, &mut instrument).unwrap();
    assert_eq!(output.stats.blocks_rendered, 1);
    assert_eq!(output.stats.events_delivered, 1);
  }

  #[test]
  pub fn channels_are_clamped() {
    let mut renderer = renderer(RenderConfig {
      channels: 10,
      ..RenderConfig::default()
    });
    let sequence = renderer.context().decoder().decode(&single_note(96)).unwrap();
    let mut instrument = RecordingInstrument::new(vec![]);
    let output = renderer.render(&sequence, &mut instrument).unwrap();
    assert_eq!(u32_at(&output.bytes, 22) & 0xffff, 8);
    assert_eq!(output.bytes.len(), HEADER_SIZE + 216 * 512 * 8 * 2);
  }

  #[test]
  pub fn multi_track_is_unsupported() {
    let data = SequenceBuilder::new(1, 96)
      .track(TrackBuilder::new().end_of_track(0))
      .track(TrackBuilder::new().end_of_track(0))
      .build();
    let mut renderer = renderer(RenderConfig::default());
    let sequence = renderer.context().decoder().decode(&data).unwrap();
    assert!(check_policy(&sequence).is_err());

    let mut instrument = RecordingInstrument::new(vec![]);
    match renderer.render(&sequence, &mut instrument) {
      Err(RenderError::UnsupportedFormat { .. }) => {}
      Err(err) => panic!("unexpected error {}", err),
      Ok(_) => panic!("unexpected success"),
    }
    assert!(!instrument.started);
  }

  #[test]
  pub fn format_one_single_track_is_unsupported() {
    let data = SequenceBuilder::new(1, 96)
      .track(TrackBuilder::new().end_of_track(0))
      .build();
    let renderer = renderer(RenderConfig::default());
    let sequence = renderer.context().decoder().decode(&data).unwrap();
    match check_policy(&sequence) {
      Err(RenderError::UnsupportedFormat { .. }) => {}
      other => panic!("unexpected result {:?}", other),
    }
  }

  #[test]
  pub fn invalid_settings() {
    let settings = RenderConfig {
      block_size: 0,
      ..RenderConfig::default()
    };
    match RenderContext::new(settings, &ClockConfig::default()) {
      Err(RenderError::InvalidSettings { .. }) => {}
      Err(err) => panic!("unexpected error {}", err),
      Ok(_) => panic!("unexpected success"),
    }

    let clock = ClockConfig {
      tempo: 0.0,
      ..ClockConfig::default()
    };
    assert!(RenderContext::new(RenderConfig::default(), &clock).is_err());
  }

  #[test]
  pub fn context_from_config() {
    let config = Config::from_str(
      "[render]\nsample_rate = 48000\n[clock]\ntempo = 90.0\n[decoder]\nstrict_message_kinds = true\n",
    )
    .unwrap();
    let context = RenderContext::from_config(&config).unwrap();
    assert_eq!(context.clock().get_sample_rate(), 48000);
    assert_eq!(context.clock().get_tempo().get_value(), 90.0);

    let data = SequenceBuilder::new(0, 96)
      .track(TrackBuilder::new().message(0, &[0x30, 1, 2]))
      .build();
    assert!(context.decoder().decode(&data).is_err());
  }
}
