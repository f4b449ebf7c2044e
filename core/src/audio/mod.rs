pub mod buffer;
pub use buffer::SampleBuffer;
