use failure::Error;

use log::info;
use serde_derive::Deserialize;

use std::fs::File;
use std::io::{ErrorKind, Read};

use crate::pcm::BitDepth;
use crate::time::{SampleRate, Signature, Tempo};

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct RenderConfig {
  pub sample_rate: SampleRate,
  pub block_size: usize,
  pub channels: u16,
  pub bit_depth: BitDepth,
  /// Blocks rendered without events once the sequence is over
  pub tail_blocks: usize,
}

impl Default for RenderConfig {
  fn default() -> RenderConfig {
    RenderConfig {
      sample_rate: 44100,
      block_size: 512,
      channels: 2,
      bit_depth: BitDepth::Sixteen,
      tail_blocks: 0,
    }
  }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ClockConfig {
  pub tempo: f64,
  pub beats_per_measure: u16,
  pub note_value: u16,
}

impl ClockConfig {
  pub fn tempo(&self) -> Tempo {
    Tempo::new(self.tempo)
  }

  pub fn signature(&self) -> Signature {
    Signature::new(self.beats_per_measure, self.note_value)
  }
}

impl Default for ClockConfig {
  fn default() -> ClockConfig {
    ClockConfig {
      tempo: 120.0,
      beats_per_measure: 4,
      note_value: 4,
    }
  }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DecoderConfig {
  pub strict_message_kinds: bool,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct InstrumentConfig {
  pub gain: f32,
  pub release_frames: u32,
}

impl Default for InstrumentConfig {
  fn default() -> InstrumentConfig {
    InstrumentConfig {
      gain: 0.25,
      release_frames: 256,
    }
  }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct PathsConfig {
  pub sequence: String,
  pub instrument: String,
  pub output: String,
}

fn non_empty(value: &str) -> Option<&str> {
  if value.is_empty() {
    None
  } else {
    Some(value)
  }
}

impl PathsConfig {
  pub fn sequence(&self) -> Option<&str> {
    non_empty(&self.sequence)
  }

  pub fn instrument(&self) -> Option<&str> {
    non_empty(&self.instrument)
  }

  pub fn output(&self) -> Option<&str> {
    non_empty(&self.output)
  }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
  pub render: RenderConfig,
  pub clock: ClockConfig,
  pub decoder: DecoderConfig,
  pub instrument: InstrumentConfig,
  pub paths: PathsConfig,
}

impl Config {
  pub fn from_file<'a, T>(path: T) -> Result<Config, Error>
  where
    T: Into<&'a str>,
  {
    let mut content = String::new();
    let path_str = path.into();
    let mut file = File::open(path_str)?;
    file.read_to_string(&mut content)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
  }

  /// Like `from_file`, but a missing file gives the default configuration.
  pub fn from_file_or_default<'a, T>(path: T) -> Result<Config, Error>
  where
    T: Into<&'a str>,
  {
    let path_str = path.into();
    match File::open(path_str) {
      Err(ref err) if err.kind() == ErrorKind::NotFound => {
        info!("No configuration at {}, using defaults", path_str);
        Ok(Config::default())
      }
      _ => Config::from_file(path_str),
    }
  }

  pub fn from_str<'a, T>(content: T) -> Result<Config, Error>
  where
    T: Into<&'a str>,
  {
    let config: Config = toml::from_str(content.into())?;
    Ok(config)
  }
}
