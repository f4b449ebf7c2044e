use std::convert::TryFrom;
use std::fmt;
use std::fs;
use std::path::Path;

use failure::Fail;
use log::info;
use serde_derive::Deserialize;

pub mod encoder;
pub use encoder::PcmEncoder;
pub mod header;
pub use header::PcmFormat;

#[derive(Debug, Fail)]
pub enum PcmError {
  #[fail(display = "Unable to write the output to {}: {}", path, cause)]
  SinkUnavailable { path: String, cause: String },

  #[fail(display = "Invalid PCM format: {}", cause)]
  InvalidFormat { cause: String },
}

pub type PcmResult<T> = Result<T, PcmError>;

/// Sample depth of the output container. Only 8-bit samples are unsigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u16")]
pub enum BitDepth {
  Eight,
  Sixteen,
  TwentyFour,
  ThirtyTwo,
}

impl BitDepth {
  pub fn bits(&self) -> u16 {
    match self {
      BitDepth::Eight => 8,
      BitDepth::Sixteen => 16,
      BitDepth::TwentyFour => 24,
      BitDepth::ThirtyTwo => 32,
    }
  }

  pub fn bytes(&self) -> usize {
    usize::from(self.bits() / 8)
  }
}

impl Default for BitDepth {
  fn default() -> BitDepth {
    BitDepth::Sixteen
  }
}

impl TryFrom<u16> for BitDepth {
  type Error = String;

  fn try_from(bits: u16) -> Result<BitDepth, Self::Error> {
    match bits {
      8 => Ok(BitDepth::Eight),
      16 => Ok(BitDepth::Sixteen),
      24 => Ok(BitDepth::TwentyFour),
      32 => Ok(BitDepth::ThirtyTwo),
      _ => Err(format!("unsupported bit depth {} (expected 8, 16, 24 or 32)", bits)),
    }
  }
}

impl fmt::Display for BitDepth {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}-bit", self.bits())
  }
}

/// Writes a finalized container to `path`.
pub fn write_file<P: AsRef<Path>>(path: P, bytes: &[u8]) -> PcmResult<()> {
  let path = path.as_ref();
  fs::write(path, bytes).map_err(|err| PcmError::SinkUnavailable {
    path: path.display().to_string(),
    cause: err.to_string(),
  })?;
  info!("Wrote {} bytes to {}", bytes.len(), path.display());
  Ok(())
}

#[cfg(test)]
mod test {
  use std::convert::TryFrom;
  use std::fs;

  use super::{write_file, BitDepth, PcmError};

  #[test]
  pub fn bit_depth_from_bits() {
    assert_eq!(BitDepth::try_from(8u16), Ok(BitDepth::Eight));
    assert_eq!(BitDepth::try_from(24u16), Ok(BitDepth::TwentyFour));
    assert!(BitDepth::try_from(12u16).is_err());
    assert_eq!(BitDepth::ThirtyTwo.bytes(), 4);
    assert_eq!(BitDepth::default(), BitDepth::Sixteen);
    assert_eq!(BitDepth::TwentyFour.to_string(), "24-bit");
  }

  #[test]
  pub fn write_file_roundtrip() {
    let path = std::env::temp_dir().join("midi-render-pcm-write-file.wav");
    write_file(&path, b"RIFF").unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"RIFF".to_vec());
    fs::remove_file(&path).unwrap();
  }

  #[test]
  pub fn write_file_sink_unavailable() {
    let path = std::env::temp_dir()
      .join("midi-render-missing-dir")
      .join("out.wav");
    match write_file(&path, b"RIFF") {
      Err(PcmError::SinkUnavailable { path: failed, .. }) => {
        assert!(failed.ends_with("out.wav"))
      }
      other => panic!("unexpected result {:?}", other),
    }
  }
}
