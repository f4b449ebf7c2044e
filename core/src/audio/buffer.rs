use std::ops::{Deref, DerefMut};
use std::slice::{Chunks, ChunksMut};

/// Planar block of samples: each channel's `block_size` samples are contiguous.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
  channels: usize,
  block_size: usize,
  data: Vec<f32>,
}

impl SampleBuffer {
  pub fn new(channels: usize, block_size: usize) -> SampleBuffer {
    SampleBuffer {
      channels,
      block_size,
      data: vec![0.0; channels * block_size],
    }
  }

  pub fn channels(&self) -> usize {
    self.channels
  }

  pub fn block_size(&self) -> usize {
    self.block_size
  }

  pub fn clear(&mut self) {
    for sample in self.data.iter_mut() {
      *sample = 0.0;
    }
  }

  pub fn channel(&self, index: usize) -> &[f32] {
    let start = index * self.block_size;
    &self.data[start..start + self.block_size]
  }

  pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
    let start = index * self.block_size;
    &mut self.data[start..start + self.block_size]
  }

  pub fn iter_channels(&self) -> Chunks<f32> {
    self.data.chunks(self.block_size.max(1))
  }

  pub fn iter_channels_mut(&mut self) -> ChunksMut<f32> {
    self.data.chunks_mut(self.block_size.max(1))
  }

  pub fn sample(&self, channel: usize, index: usize) -> f32 {
    self.data[channel * self.block_size + index]
  }
}

impl Deref for SampleBuffer {
  type Target = [f32];
  fn deref(&self) -> &Self::Target {
    &self.data
  }
}

impl DerefMut for SampleBuffer {
  fn deref_mut(&mut self) -> &mut [f32] {
    &mut self.data
  }
}
