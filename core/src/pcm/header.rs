use crate::pcm::{BitDepth, PcmError, PcmResult};

pub const HEADER_SIZE: usize = 44;
pub const RIFF_SIZE_OFFSET: usize = 4;
pub const DATA_SIZE_OFFSET: usize = 40;

const FORMAT_CHUNK_SIZE: u32 = 16;
const FORMAT_PCM: u16 = 1;

/// Stream parameters fixed when the container is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
  channels: u16,
  sample_rate: u32,
  bit_depth: BitDepth,
  block_align: u16,
  byte_rate: u32,
}

impl PcmFormat {
  /// Fails when the derived block alignment or byte rate do not fit their
  /// header fields.
  pub fn new(channels: u16, sample_rate: u32, bit_depth: BitDepth) -> PcmResult<PcmFormat> {
    let invalid = |what: &str| PcmError::InvalidFormat {
      cause: format!(
        "{} channel(s) at {} Hz and {} overflow the {}",
        channels, sample_rate, bit_depth, what
      ),
    };

    let block_align = channels
      .checked_mul(bit_depth.bits() / 8)
      .ok_or_else(|| invalid("block alignment"))?;
    let byte_rate = sample_rate
      .checked_mul(u32::from(block_align))
      .ok_or_else(|| invalid("byte rate"))?;

    Ok(PcmFormat {
      channels,
      sample_rate,
      bit_depth,
      block_align,
      byte_rate,
    })
  }

  pub fn channels(&self) -> u16 {
    self.channels
  }

  pub fn bit_depth(&self) -> BitDepth {
    self.bit_depth
  }

  pub fn block_align(&self) -> u16 {
    self.block_align
  }

  pub fn byte_rate(&self) -> u32 {
    self.byte_rate
  }

  /// Appends the 44 byte header with both size fields zeroed.
  pub fn write_header(&self, out: &mut Vec<u8>) {
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&FORMAT_CHUNK_SIZE.to_le_bytes());
    out.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    out.extend_from_slice(&self.channels.to_le_bytes());
    out.extend_from_slice(&self.sample_rate.to_le_bytes());
    out.extend_from_slice(&self.byte_rate().to_le_bytes());
    out.extend_from_slice(&self.block_align().to_le_bytes());
    out.extend_from_slice(&self.bit_depth.bits().to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&0u32.to_le_bytes());
  }
}

/// Backpatches the container size fields once the data length is known.
pub fn patch_sizes(container: &mut [u8], data_len: u32) {
  let riff_size = data_len.saturating_add((HEADER_SIZE - 8) as u32);
  container[RIFF_SIZE_OFFSET..RIFF_SIZE_OFFSET + 4].copy_from_slice(&riff_size.to_le_bytes());
  container[DATA_SIZE_OFFSET..DATA_SIZE_OFFSET + 4].copy_from_slice(&data_len.to_le_bytes());
}
