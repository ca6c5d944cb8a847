//! Terminal host for dayprog.
//!
//! Opens a document in a single editor view, attaches the day-progress
//! plugin, and prints what a live-preview editor would show:
//! - `render` paints the viewport with timestamp tokens replaced by widgets
//! - `insert` runs the "Insert time stamp" command at an offset
//! - `stamp` prints the token for the current moment

mod args;
mod logging;
mod render;
mod session;

use std::{
  fs::File,
  io::{
    BufReader,
    IsTerminal,
  },
  path::{
    Path,
    PathBuf,
  },
};

use clap::{
  ArgAction,
  Parser,
  Subcommand,
};
use dayprog_core::timestamp::now_timestamp;
use dayprog_lib::{
  command::INSERT_TIMESTAMP,
  config::ProgressConfig,
  selection::{
    Range,
    Selection,
  },
  view::{
    EditorView,
    RenderMode,
    Viewport,
  },
};
use eyre::{
  Result,
  WrapErr,
};
use ropey::Rope;

use crate::{
  render::Output,
  session::Session,
};

#[derive(Debug, Parser)]
#[command(name = "dayprog")]
#[command(about = "Inline day-progress widgets for timestamp tokens")]
struct Cli {
  /// Progress config file (TOML)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Increase log verbosity (-v, -vv, -vvv)
  #[arg(short, long, action = ArgAction::Count, global = true)]
  verbose: u8,

  #[command(subcommand)]
  command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
  /// Print the visible lines of a file with progress widgets in place
  Render {
    /// Path to file to open
    file: PathBuf,

    /// Put a cursor at this char offset
    #[arg(long)]
    cursor: Option<usize>,

    /// Select FROM:TO (char offsets); repeat for multiple selections
    #[arg(long = "select", value_name = "FROM:TO", value_parser = args::parse_range)]
    select: Vec<Range>,

    /// Show raw text instead of live preview
    #[arg(long)]
    source: bool,

    /// Visible lines as TOP:HEIGHT
    #[arg(long, value_name = "TOP:HEIGHT", value_parser = args::parse_viewport)]
    viewport: Option<Viewport>,

    /// Print widget markup instead of terminal bars
    #[arg(long, conflicts_with = "plain")]
    html: bool,

    /// Never emit color codes
    #[arg(long)]
    plain: bool,
  },

  /// Insert the current time stamp at a char offset and print the document
  Insert {
    /// Path to file to open
    file: PathBuf,

    /// Char offset to insert at
    #[arg(long)]
    at: usize,
  },

  /// Print the time stamp for the current moment
  Stamp,
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  logging::setup(cli.verbose)?;
  let config = load_config(cli.config.as_deref())?;

  match cli.command {
    Command::Render {
      file,
      cursor,
      select,
      source,
      viewport,
      html,
      plain,
    } => {
      let mut view = EditorView::with_viewport(read_document(&file)?, viewport.unwrap_or_default());

      let mut ranges = select;
      ranges.extend(cursor.map(Range::point));
      let mut ranges = ranges.into_iter();
      if let Some(first) = ranges.next() {
        let selection = ranges.fold(Selection::from(first), Selection::push);
        view.set_selection(selection)?;
      }
      if source {
        view.set_mode(RenderMode::Source);
      }

      let output = if html {
        Output::Html
      } else if plain || !std::io::stdout().is_terminal() {
        Output::Plain
      } else {
        Output::Styled
      };

      let session = Session::open(view, &config)?;
      let decorations = session.decorations();
      print!(
        "{}",
        render::render(session.view(), &decorations, &config, output)
      );
    },
    Command::Insert { file, at } => {
      let mut view = EditorView::new(read_document(&file)?);
      view.set_selection(Selection::point(at))?;

      let mut session = Session::open(view, &config)?;
      session.run_command(INSERT_TIMESTAMP.id)?;
      print!("{}", session.view().text());
    },
    Command::Stamp => println!("{}", now_timestamp()),
  }

  Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ProgressConfig> {
  let Some(path) = path else {
    return Ok(ProgressConfig::default());
  };
  let source = std::fs::read_to_string(path)
    .wrap_err_with(|| format!("failed to read config {}", path.display()))?;
  ProgressConfig::from_toml(&source).wrap_err_with(|| format!("invalid config {}", path.display()))
}

fn read_document(path: &Path) -> Result<Rope> {
  let file = File::open(path).wrap_err_with(|| format!("failed to open {}", path.display()))?;
  Ok(Rope::from_reader(BufReader::new(file))?)
}
