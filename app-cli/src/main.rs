use std::env;

use log::{debug, info, warn, LevelFilter};

use failure::{Error, Fail};

use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config as LogConfig, Root};
use log4rs::encode::pattern::PatternEncoder;

use midi_render_core::config::{Config, PathsConfig};
use midi_render_core::instrument::Instruments;
use midi_render_core::midi::Sequence;
use midi_render_core::pcm;
use midi_render_core::render::{RenderContext, Renderer};

const MIDI_RENDER_CONFIG: &str = "MIDI_RENDER_CONFIG";
const DEFAULT_MIDI_RENDER_CONFIG: &str = "render.toml";

const MIDI_RENDER_LOG_CONFIG: &str = "MIDI_RENDER_LOG_CONFIG";
const DEFAULT_MIDI_RENDER_LOG_CONFIG: &str = "log4rs.yaml";

const USAGE: &str = "usage: midi-render [sequence] [instrument] [output]";

#[derive(Debug, Fail)]
enum MainError {
  #[fail(display = "Failed to init logging: {}", cause)]
  LoggingInit { cause: String },

  #[fail(display = "No sequence file given ({})", usage)]
  MissingSequence { usage: &'static str },
}

fn main() -> Result<(), Error> {
  init_logging()?;

  let mut config = init_config()?;
  override_paths(&mut config.paths, env::args().skip(1));

  let sequence_path = config
    .paths
    .sequence()
    .ok_or(MainError::MissingSequence { usage: USAGE })?
    .to_string();

  let context = RenderContext::from_config(&config)?;
  let sequence = context.decoder().decode_file(&sequence_path)?;
  log_summary(&sequence);

  let (instrument_id, output_path) = match (config.paths.instrument(), config.paths.output()) {
    (Some(instrument_id), Some(output_path)) => (instrument_id, output_path),
    _ => {
      info!("No instrument or output path given, nothing to render");
      return Ok(());
    }
  };

  let instruments = Instruments::new();
  let mut instrument = instruments.instrument(instrument_id, &config.instrument)?;

  let mut renderer = Renderer::new(context);
  let output = renderer.render(&sequence, instrument.as_mut())?;
  debug!("{:#?}", output.stats);

  pcm::write_file(output_path, &output.bytes)?;

  Ok(())
}

fn init_logging() -> Result<(), Error> {
  let log_config_path = env::var(MIDI_RENDER_LOG_CONFIG)
    .unwrap_or_else(|_| DEFAULT_MIDI_RENDER_LOG_CONFIG.to_string());

  if let Err(err) = log4rs::init_file(log_config_path.as_str(), Default::default()) {
    init_console_logging()?;
    warn!(
      "Unable to load the logging configuration from {}: {}",
      log_config_path, err
    );
  }

  Ok(())
}

fn init_console_logging() -> Result<(), Error> {
  let stdout = ConsoleAppender::builder()
    .encoder(Box::new(PatternEncoder::new(
      "{d(%H:%M:%S%.3f)} {h({l:5})} {t} - {m}{n}",
    )))
    .build();

  let log_config = LogConfig::builder()
    .appender(Appender::builder().build("stdout", Box::new(stdout)))
    .build(Root::builder().appender("stdout").build(LevelFilter::Info))
    .map_err(|err| MainError::LoggingInit {
      cause: err.to_string(),
    })?;

  log4rs::init_config(log_config).map_err(|err| MainError::LoggingInit {
    cause: err.to_string(),
  })?;

  Ok(())
}

fn init_config() -> Result<Config, Error> {
  let config_path =
    env::var(MIDI_RENDER_CONFIG).unwrap_or_else(|_| DEFAULT_MIDI_RENDER_CONFIG.to_string());

  info!("Loading render configuration from {} ...", config_path);
  let config = Config::from_file_or_default(config_path.as_str())?;
  debug!("{:#?}", config);

  Ok(config)
}

/// Positional arguments take precedence over the `[paths]` section.
fn override_paths<I>(paths: &mut PathsConfig, args: I)
where
  I: Iterator<Item = String>,
{
  let mut targets = [&mut paths.sequence, &mut paths.instrument, &mut paths.output];
  for (target, arg) in targets.iter_mut().zip(args) {
    **target = arg;
  }
}

fn log_summary(sequence: &Sequence) {
  info!(
    "Sequence: format {}, {} track(s), {} ticks per quarter note",
    sequence.format(),
    sequence.track_count(),
    sequence.time_division()
  );
  for track in sequence.tracks() {
    info!(
      "  Track {} {:?}: {} event(s), {} playable, {} skipped, last event at frame {}",
      track.index(),
      track.name().unwrap_or_default(),
      track.events().len(),
      track.sequence().len(),
      track.skipped_messages(),
      track.duration()
    );
  }
}
