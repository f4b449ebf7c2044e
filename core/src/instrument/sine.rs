use std::f64::consts::PI;

use log::{debug, trace};

use crate::audio::SampleBuffer;
use crate::instrument::{ChannelLayout, Instrument, InstrumentError, InstrumentEvent, InstrumentResult};
use crate::midi::types::{U4, U7};
use crate::midi::Message;
use crate::time::{Frames, SampleRate, TimeInfo};

pub const ID: &str = "sine";

const MAX_VOICES: usize = 64;
const PITCH_BEND_CENTER: f64 = 8192.0;
const PITCH_BEND_RANGE: f64 = 2.0;

fn key_frequency(key: U7, bend: f64) -> f64 {
  440.0 * 2f64.powf((f64::from(key) - 69.0 + bend) / 12.0)
}

#[derive(Debug, Clone)]
struct Voice {
  channel: U4,
  key: U7,
  phase: f64,
  amplitude: f64,
  // Frames left of the release ramp, once released
  release: Option<u32>,
}

impl Voice {
  fn envelope(&self, release_frames: u32) -> f64 {
    match self.release {
      Some(remaining) if release_frames > 0 => f64::from(remaining) / f64::from(release_frames),
      Some(_) => 0.0,
      None => 1.0,
    }
  }

  fn is_finished(&self) -> bool {
    self.release == Some(0)
  }
}

/// Polyphonic sine voices with velocity scaled amplitude and a linear release.
///
/// Every output channel carries the same signal.
pub struct SineInstrument {
  gain: f64,
  release_frames: u32,
  sample_rate: f64,
  block_size: usize,
  layout: ChannelLayout,
  running: bool,
  pending: Vec<InstrumentEvent>,
  voices: Vec<Voice>,
  pitch_bend: [f64; 16],
}

impl SineInstrument {
  pub fn new(gain: f32, release_frames: u32) -> SineInstrument {
    SineInstrument {
      gain: f64::from(gain),
      release_frames,
      sample_rate: 44100.0,
      block_size: 0,
      layout: ChannelLayout::Stereo,
      running: false,
      pending: Vec::new(),
      voices: Vec::new(),
      pitch_bend: [0.0; 16],
    }
  }

  pub fn active_voices(&self) -> usize {
    self.voices.len()
  }

  fn handle(&mut self, event: &InstrumentEvent) {
    let message = match event.message() {
      Some(message) => message,
      None => return,
    };
    trace!("{:?}", message);

    match message {
      Message::NoteOn {
        channel,
        key,
        velocity,
      } => {
        if self.voices.len() >= MAX_VOICES {
          debug!("Voice limit reached, stealing the oldest voice");
          self.voices.remove(0);
        }
        self.voices.push(Voice {
          channel,
          key,
          phase: 0.0,
          amplitude: f64::from(velocity) / 127.0,
          release: None,
        });
      }
      Message::NoteOff { channel, key, .. } => {
        let release_frames = self.release_frames;
        for voice in self.voices.iter_mut() {
          if voice.channel == channel && voice.key == key && voice.release.is_none() {
            voice.release = Some(release_frames);
          }
        }
      }
      Message::AllNotesOff { channel } => {
        let release_frames = self.release_frames;
        for voice in self.voices.iter_mut() {
          if voice.channel == channel && voice.release.is_none() {
            voice.release = Some(release_frames);
          }
        }
      }
      Message::AllSoundOff { channel } => {
        self.voices.retain(|voice| voice.channel != channel);
      }
      Message::ResetAllControllers { channel } => {
        self.pitch_bend[usize::from(channel)] = 0.0;
      }
      Message::PitchBend { channel, value } => {
        self.pitch_bend[usize::from(channel)] =
          (f64::from(value) - PITCH_BEND_CENTER) / PITCH_BEND_CENTER * PITCH_BEND_RANGE;
      }
      _ => {}
    }
  }

  fn next_sample(&mut self) -> f64 {
    let release_frames = self.release_frames;
    let sample_rate = self.sample_rate;
    let pitch_bend = self.pitch_bend;

    let mut mix = 0.0;
    for voice in self.voices.iter_mut() {
      mix += (voice.phase * 2.0 * PI).sin() * voice.amplitude * voice.envelope(release_frames);

      let increment = key_frequency(voice.key, pitch_bend[usize::from(voice.channel)]) / sample_rate;
      voice.phase = (voice.phase + increment).fract();
      if let Some(remaining) = voice.release.as_mut() {
        *remaining = remaining.saturating_sub(1);
      }
    }
    self.voices.retain(|voice| !voice.is_finished());

    mix * self.gain
  }
}

impl Instrument for SineInstrument {
  fn name(&self) -> &str {
    ID
  }

  fn configure(
    &mut self,
    sample_rate: SampleRate,
    block_size: usize,
    layout: ChannelLayout,
  ) -> InstrumentResult<()> {
    if sample_rate == 0 || block_size == 0 {
      return Err(InstrumentError::Configure {
        cause: format!(
          "invalid sample rate {} or block size {}",
          sample_rate, block_size
        ),
      });
    }
    self.sample_rate = f64::from(sample_rate);
    self.block_size = block_size;
    self.layout = layout;
    debug!(
      "Sine instrument configured: {} Hz, {} frames, {:?}",
      sample_rate, block_size, layout
    );
    Ok(())
  }

  fn start(&mut self) {
    self.running = true;
  }

  fn stop(&mut self) {
    self.running = false;
    self.voices.clear();
    self.pending.clear();
  }

  fn deliver_events(&mut self, events: &[InstrumentEvent]) {
    self.pending.extend_from_slice(events);
  }

  fn render_block(&mut self, _time: &TimeInfo, output: &mut SampleBuffer) {
    output.clear();
    if !self.running {
      self.pending.clear();
      return;
    }

    let mut pending = std::mem::replace(&mut self.pending, Vec::new());
    pending.sort_by_key(|event| event.delta);
    let mut next_event = 0;

    for index in 0..output.block_size() {
      while next_event < pending.len() && pending[next_event].delta <= index as Frames {
        self.handle(&pending[next_event]);
        next_event += 1;
      }

      let sample = self.next_sample() as f32;
      for channel in output.iter_channels_mut() {
        channel[index] = sample;
      }
    }

    // Offsets past the end of the block apply from the next one
    for event in pending[next_event..].iter() {
      self.handle(event);
    }
  }

  fn latency(&self) -> Frames {
    0
  }
}
