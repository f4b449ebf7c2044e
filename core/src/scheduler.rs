use std::collections::VecDeque;

use log::{debug, trace, warn};

use crate::midi::{Event, MetaKind, Track};
use crate::time::{AudioClock, Frames, Signature, Tempo};

/// Pops from `queue` every event whose timestamp lies in the inclusive range
/// `[start, end]`, setting its `delta` relative to `start`.
///
/// Events before `start` are expired: they are dropped with a warning and
/// counted in `expired`. The first event after `end` stays at the front of
/// the queue. The returned flag is false only when the queue ran dry during
/// the scan.
pub fn extract_window_counting(
  queue: &mut VecDeque<Event>,
  start: Frames,
  end: Frames,
  expired: &mut usize,
) -> (Vec<Event>, bool) {
  let mut window = Vec::new();

  while let Some(&front) = queue.front() {
    if front.timestamp < start {
      warn!(
        "Expired event at frame {} (window starts at {}): {:?}",
        front.timestamp, start, front.kind
      );
      *expired += 1;
      queue.pop_front();
    } else if front.timestamp > end {
      return (window, true);
    } else {
      queue.pop_front();
      let event = Event {
        delta: front.timestamp - start,
        ..front
      };
      trace!("[{}+{}] {:?}", start, event.delta, event.kind);
      window.push(event);
    }
  }

  (window, false)
}

pub fn extract_window(queue: &mut VecDeque<Event>, start: Frames, end: Frames) -> (Vec<Event>, bool) {
  let mut expired = 0;
  extract_window_counting(queue, start, end, &mut expired)
}

/// Applies the tempo, meter and end-of-track events of a window to the clock.
///
/// The window is only read; the same events are later forwarded untouched.
/// Every change takes effect from the start of the block containing it.
/// Returns false once an end-of-track event has been seen.
pub fn apply_meta_events(window: &[Event], data: &[u8], clock: &mut AudioClock) -> bool {
  let mut continue_rendering = true;

  for event in window.iter() {
    let payload = event.data.resolve(data);
    match event.meta_kind() {
      Some(MetaKind::SetTempo) => apply_tempo(event, payload, clock),
      Some(MetaKind::TimeSignature) => apply_signature(event, payload, clock),
      Some(MetaKind::EndOfTrack) => {
        debug!("End of track at frame {}", event.timestamp);
        continue_rendering = false;
      }
      _ => {}
    }
  }

  continue_rendering
}

fn apply_tempo(event: &Event, payload: &[u8], clock: &mut AudioClock) {
  if payload.len() < 3 {
    warn!(
      "Ignoring tempo change at frame {} with a {} byte payload",
      event.timestamp,
      payload.len()
    );
    return;
  }

  let micros_per_beat =
    (u32::from(payload[0]) << 16) | (u32::from(payload[1]) << 8) | u32::from(payload[2]);

  match Tempo::from_micros_per_beat(micros_per_beat) {
    Some(tempo) => clock.set_tempo(tempo),
    None => warn!(
      "Ignoring tempo change at frame {} with 0 microseconds per beat",
      event.timestamp
    ),
  }
}

fn apply_signature(event: &Event, payload: &[u8], clock: &mut AudioClock) {
  if payload.len() < 2 {
    warn!(
      "Ignoring time signature at frame {} with a {} byte payload",
      event.timestamp,
      payload.len()
    );
    return;
  }

  if payload[0] == 0 {
    warn!(
      "Ignoring time signature at frame {} with 0 beats per measure",
      event.timestamp
    );
    return;
  }

  match Signature::from_meta(payload[0], payload[1]) {
    Some(signature) => clock.set_signature(signature),
    None => warn!(
      "Ignoring time signature at frame {}: note value 2^{} is out of range",
      event.timestamp, payload[1]
    ),
  }
}

/// One block worth of scheduled events
#[derive(Debug, Clone)]
pub struct ScheduledWindow {
  pub start: Frames,
  pub events: Vec<Event>,
  /// Events remain queued after this window
  pub more: bool,
  /// No end-of-track event was found in this window
  pub proceed: bool,
}

impl ScheduledWindow {
  pub fn is_empty(&self) -> bool {
    self.events.is_empty()
  }

  pub fn is_last(&self) -> bool {
    !self.more || !self.proceed
  }
}

/// Walks the playback sequence of a track block by block.
pub struct BlockScheduler<'a> {
  track: &'a Track,
  queue: VecDeque<Event>,
  block_size: Frames,
  expired_events: usize,
  meta_events_applied: usize,
}

impl<'a> BlockScheduler<'a> {
  pub fn new(track: &'a Track, block_size: Frames) -> BlockScheduler<'a> {
    BlockScheduler {
      track,
      queue: track.sequence().clone(),
      block_size,
      expired_events: 0,
      meta_events_applied: 0,
    }
  }

  /// Extracts the events of the block starting at the clock's current frame
  /// and applies the meta events among them to the clock.
  pub fn next_window(&mut self, clock: &mut AudioClock) -> ScheduledWindow {
    let start = clock.get_current_frame();
    let end = start + self.block_size.saturating_sub(1);

    let (events, more) = extract_window_counting(&mut self.queue, start, end, &mut self.expired_events);

    self.meta_events_applied += events.iter().filter(|event| event.meta_kind().is_some()).count();
    let proceed = apply_meta_events(&events, self.track.data(), clock);

    if !events.is_empty() {
      debug!(
        "Window [{}, {}]: {} event(s), {} queued",
        start,
        end,
        events.len(),
        self.queue.len()
      );
    }

    ScheduledWindow {
      start,
      events,
      more,
      proceed,
    }
  }

  pub fn payload(&self, event: &Event) -> &'a [u8] {
    self.track.payload(event)
  }

  pub fn queued(&self) -> usize {
    self.queue.len()
  }

  pub fn expired_events(&self) -> usize {
    self.expired_events
  }

  pub fn meta_events_applied(&self) -> usize {
    self.meta_events_applied
  }
}
