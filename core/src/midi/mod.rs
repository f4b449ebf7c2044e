pub mod bytes;
pub mod decoder;
pub use decoder::{DecodeError, DecodeResult, SequenceDecoder};
pub mod event;
pub use event::{ChannelMessage, DataRef, Event, EventKind, MetaKind};
pub mod messages;
pub use messages::{Message, MessageKind};
pub mod sequence;
pub use sequence::{Header, Sequence};
pub mod track;
pub use track::Track;
pub mod types;

#[cfg(test)]
pub mod testing;
