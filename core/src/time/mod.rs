pub mod clock;
pub mod position;
pub mod signature;
pub mod tempo;
pub mod ticks;

pub use self::clock::AudioClock;
pub use self::position::{MusicalPosition, TimeInfo};
pub use self::signature::Signature;
pub use self::tempo::Tempo;
pub use self::ticks::TicksTime;

pub type SampleRate = u32;

/// Absolute position or duration measured in sample frames
pub type Frames = u64;
