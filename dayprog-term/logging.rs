use eyre::Result;
use log::LevelFilter;

/// Map `-v` repetitions to a level. Warnings are always shown.
pub fn level_for(verbosity: u8) -> LevelFilter {
  match verbosity {
    0 => LevelFilter::Warn,
    1 => LevelFilter::Info,
    2 => LevelFilter::Debug,
    _ => LevelFilter::Trace,
  }
}

/// Send log records to stderr so stdout stays clean for output.
pub fn setup(verbosity: u8) -> Result<()> {
  fern::Dispatch::new()
    .format(|out, message, record| {
      out.finish(format_args!(
        "{} {:<5} {}: {}",
        chrono::Local::now().format("%H:%M:%S%.3f"),
        record.level(),
        record.target(),
        message
      ))
    })
    .level(level_for(verbosity))
    .chain(std::io::stderr())
    .apply()?;
  Ok(())
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn verbosity_levels() {
    assert_eq!(level_for(0), LevelFilter::Warn);
    assert_eq!(level_for(1), LevelFilter::Info);
    assert_eq!(level_for(2), LevelFilter::Debug);
    assert_eq!(level_for(9), LevelFilter::Trace);
  }
}
