use std::convert::TryFrom;

use log::{debug, warn};

use crate::audio::SampleBuffer;
use crate::pcm::header::{patch_sizes, HEADER_SIZE};
use crate::pcm::{BitDepth, PcmFormat, PcmResult};

const MAX_8: f64 = 127.0;
const MAX_16: f64 = 32_767.0;
const MAX_24: f64 = 8_388_607.0;
const MAX_32: f64 = 2_147_483_647.0;

/// Encodes planar float blocks into an in-memory PCM container.
///
/// Nothing reaches a sink before `finalize`.
pub struct PcmEncoder {
  format: PcmFormat,
  bytes: Vec<u8>,
  data_len: usize,
}

impl PcmEncoder {
  pub fn open(channels: u16, sample_rate: u32, bit_depth: BitDepth) -> PcmResult<PcmEncoder> {
    let format = PcmFormat::new(channels, sample_rate, bit_depth)?;
    let mut bytes = Vec::with_capacity(HEADER_SIZE);
    format.write_header(&mut bytes);
    debug!(
      "Opened PCM stream: {} channel(s), {} Hz, {}",
      channels, sample_rate, bit_depth
    );
    Ok(PcmEncoder {
      format,
      bytes,
      data_len: 0,
    })
  }

  /// Sample bytes written so far
  pub fn data_len(&self) -> usize {
    self.data_len
  }

  /// Interleaves one block: every channel's sample for an index before the
  /// next index. Channels missing from the block are written as silence.
  pub fn write_block(&mut self, block: &SampleBuffer) {
    let channels = usize::from(self.format.channels());
    let bit_depth = self.format.bit_depth();
    let start = self.bytes.len();
    self
      .bytes
      .reserve(block.block_size() * channels * bit_depth.bytes());

    for index in 0..block.block_size() {
      for channel in 0..channels {
        let sample = if channel < block.channels() {
          block.sample(channel, index)
        } else {
          0.0
        };
        encode_sample(sample, bit_depth, &mut self.bytes);
      }
    }

    self.data_len += self.bytes.len() - start;
  }

  /// Backpatches the size fields and returns the whole container.
  pub fn finalize(mut self) -> Vec<u8> {
    let data_len = u32::try_from(self.data_len).unwrap_or_else(|_| {
      warn!(
        "{} bytes of sample data exceed the container size fields",
        self.data_len
      );
      u32::max_value()
    });
    patch_sizes(&mut self.bytes, data_len);
    self.bytes
  }
}

/// Truncating conversion of one sample in [-1.0, 1.0].
pub fn encode_sample(sample: f32, bit_depth: BitDepth, out: &mut Vec<u8>) {
  let sample = f64::from(sample);
  match bit_depth {
    BitDepth::Eight => out.push(((sample + 1.0) * MAX_8) as u8),
    BitDepth::Sixteen => out.extend_from_slice(&((sample * MAX_16) as i16).to_le_bytes()),
    BitDepth::TwentyFour => out.extend_from_slice(&((sample * MAX_24) as i32).to_le_bytes()[..3]),
    BitDepth::ThirtyTwo => out.extend_from_slice(&((sample * MAX_32) as i32).to_le_bytes()),
  }
}
