use std::fs;
use std::path::Path;

use log::{debug, info, trace, warn};

use failure::Fail;

use crate::midi::bytes::ByteReader;
use crate::midi::event::{ChannelMessage, MetaKind, META, SYSEX_ESCAPE, SYSEX_START};
use crate::midi::messages::MessageKind;
use crate::midi::sequence::{Header, Sequence};
use crate::midi::track::Track;
use crate::time::{AudioClock, Frames, TicksTime};

const HEADER_TAG: &[u8; 4] = b"MThd";
const TRACK_TAG: &[u8; 4] = b"MTrk";
const HEADER_LENGTH: u32 = 6;
const SMPTE_TIME_DIVISION: u16 = 0x8000;

#[derive(Debug, Fail)]
pub enum DecodeError {
  #[fail(display = "Unable to read the sequence file: {}", cause)]
  Io { cause: String },

  #[fail(display = "Malformed {} chunk: {}", expected, cause)]
  MalformedChunk { expected: String, cause: String },

  #[fail(display = "Unsupported sequence format: {}", cause)]
  UnsupportedFormat { cause: String },

  #[fail(display = "Malformed track {}: {}", track, cause)]
  MalformedTrack { track: usize, cause: String },

  #[fail(
    display = "Unknown message kind in track {}: status {:#04x} at byte {}",
    track, status, position
  )]
  UnknownMessageKind {
    track: usize,
    status: u8,
    position: usize,
  },
}

pub type DecodeResult<T> = Result<T, DecodeError>;

fn malformed_chunk(tag: &[u8; 4], cause: String) -> DecodeError {
  DecodeError::MalformedChunk {
    expected: String::from_utf8_lossy(tag).into_owned(),
    cause,
  }
}

/// Decodes a sequence file into tracks of events timestamped in sample frames.
///
/// Ticks are converted with the tempo the clock holds when decoding starts.
pub struct SequenceDecoder<'a> {
  clock: &'a AudioClock,
  strict: bool,
}

impl<'a> SequenceDecoder<'a> {
  pub fn new(clock: &'a AudioClock) -> SequenceDecoder<'a> {
    SequenceDecoder {
      clock,
      strict: false,
    }
  }

  /// When strict, an unclassifiable channel message fails the decode instead
  /// of being skipped.
  pub fn strict(self, strict: bool) -> SequenceDecoder<'a> {
    SequenceDecoder { strict, ..self }
  }

  pub fn decode_file<P: AsRef<Path>>(&self, path: P) -> DecodeResult<Sequence> {
    let path = path.as_ref();
    info!("Decoding sequence file {} ...", path.display());
    let data = fs::read(path).map_err(|err| DecodeError::Io {
      cause: format!("{}: {}", path.display(), err),
    })?;
    self.decode(&data)
  }

  pub fn decode(&self, data: &[u8]) -> DecodeResult<Sequence> {
    let mut reader = ByteReader::new(data);

    let header = self.decode_header(&mut reader)?;
    info!(
      "Sequence format {}, {} track(s), {} ticks per quarter note",
      header.format, header.track_count, header.time_division
    );

    let mut tracks = Vec::with_capacity(usize::from(header.track_count));
    for index in 0..usize::from(header.track_count) {
      let track = self.decode_track(&mut reader, index, header.time_division)?;
      info!(
        "Track {}: {} event(s), {} in playback sequence",
        index,
        track.events().len(),
        track.sequence().len()
      );
      tracks.push(track);
    }

    if !reader.is_empty() {
      debug!("Ignoring {} trailing byte(s)", reader.remaining());
    }

    Ok(Sequence::new(header, tracks))
  }

  fn expect_chunk(reader: &mut ByteReader, tag: &[u8; 4]) -> DecodeResult<()> {
    let found = reader
      .read_tag()
      .map_err(|pos| malformed_chunk(tag, format!("truncated chunk tag at byte {}", pos)))?;
    if &found != tag {
      return Err(malformed_chunk(
        tag,
        format!(
          "unexpected chunk tag {:?}",
          String::from_utf8_lossy(&found).into_owned()
        ),
      ));
    }
    Ok(())
  }

  fn decode_header(&self, reader: &mut ByteReader) -> DecodeResult<Header> {
    Self::expect_chunk(reader, HEADER_TAG)?;

    let truncated = |pos| malformed_chunk(HEADER_TAG, format!("truncated at byte {}", pos));

    let length = reader.read_u32().map_err(truncated)?;
    if length != HEADER_LENGTH {
      return Err(malformed_chunk(
        HEADER_TAG,
        format!(
          "unexpected header length {} (expected {})",
          length, HEADER_LENGTH
        ),
      ));
    }

    let format = reader.read_u16().map_err(truncated)?;
    let track_count = reader.read_u16().map_err(truncated)?;
    let time_division = reader.read_u16().map_err(truncated)?;

    if time_division & SMPTE_TIME_DIVISION != 0 {
      return Err(DecodeError::UnsupportedFormat {
        cause: format!("SMPTE frame based time division {:#06x}", time_division),
      });
    }

    if time_division == 0 {
      return Err(malformed_chunk(
        HEADER_TAG,
        "zero ticks per quarter note".to_string(),
      ));
    }

    Ok(Header {
      format,
      track_count,
      time_division,
    })
  }

  fn decode_track(
    &self,
    reader: &mut ByteReader,
    index: usize,
    time_division: u16,
  ) -> DecodeResult<Track> {
    Self::expect_chunk(reader, TRACK_TAG)?;

    let malformed = |cause: String| DecodeError::MalformedTrack {
      track: index,
      cause,
    };

    let length = reader
      .read_u32()
      .map_err(|pos| malformed(format!("truncated length at byte {}", pos)))?;
    let start = reader.position();
    let mut body = reader.sub_reader(length as usize).map_err(|_| {
      malformed(format!(
        "declared length {} exceeds the {} remaining byte(s)",
        length,
        reader.remaining()
      ))
    })?;

    // Ran past the declared track length or the end of the file
    let overrun =
      |what: &str, pos: usize| malformed(format!("overrun while reading {} at byte {}", what, start + pos));

    let frames_per_tick = self.clock.frames_per_tick(time_division);
    let mut timestamp: Frames = 0;
    let mut track = Track::new(index);

    while !body.is_empty() {
      let delta = body
        .read_variable_length()
        .map_err(|pos| overrun("delta time", pos))?;
      timestamp = timestamp.saturating_add(TicksTime::from(delta).to_frames(frames_per_tick));

      let status = body.read_u8().map_err(|pos| overrun("event type", pos))?;
      match status {
        META => {
          let meta_type = body.read_u8().map_err(|pos| overrun("meta type", pos))?;
          let len = body.read_u8().map_err(|pos| overrun("meta length", pos))?;
          match MetaKind::from_byte(meta_type) {
            Some(kind) => {
              let payload = body
                .read_slice(usize::from(len))
                .map_err(|pos| overrun("meta data", pos))?;
              trace!("[{}] meta {:?} {:?}", timestamp, kind, payload);
              track.push_meta(timestamp, kind, payload);
            }
            None => {
              trace!("[{}] skipping meta {:#04x} ({} bytes)", timestamp, meta_type, len);
              body
                .skip(usize::from(len))
                .map_err(|pos| overrun("meta data", pos))?;
            }
          }
        }
        SYSEX_START | SYSEX_ESCAPE => {
          let len = body.read_u8().map_err(|pos| overrun("sysex length", pos))?;
          trace!("[{}] skipping sysex ({} bytes)", timestamp, len);
          body
            .skip(usize::from(len))
            .map_err(|pos| overrun("sysex data", pos))?;
        }
        _ => {
          let position = start + body.position() - 1;
          let first = body
            .read_u8()
            .map_err(|pos| overrun("message data", pos))?;
          match MessageKind::classify(status, first) {
            Some(kind) => {
              let message = ChannelMessage {
                kind,
                channel: status & 0x0f,
                status,
              };
              if kind.data_len() > 1 {
                let second = body
                  .read_u8()
                  .map_err(|pos| overrun("message data", pos))?;
                trace!("[{}] {:?} {} {}", timestamp, message, first, second);
                track.push_message(timestamp, message, &[first, second]);
              } else {
                trace!("[{}] {:?} {}", timestamp, message, first);
                track.push_message(timestamp, message, &[first]);
              }
            }
            None if self.strict => {
              return Err(DecodeError::UnknownMessageKind {
                track: index,
                status,
                position,
              });
            }
            None => {
              warn!(
                "Unknown message kind {:#04x} at byte {} of track {}, skipping 2 data bytes; \
                 the rest of the track may be misaligned",
                status, position, index
              );
              body
                .skip(1)
                .map_err(|pos| overrun("unknown message data", pos))?;
              track.skip_message();
            }
          }
        }
      }
    }

    Ok(track.finish())
  }
}
