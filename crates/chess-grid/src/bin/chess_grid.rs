use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chess_grid::{
    ChessGridConfig, ChessGridSession, ClickRecorder, DetectionReport, MoveReport, Orientation,
    PieceColor, ScreenRect, SessionError, StillImageScreen,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(
    name = "chess-grid",
    version,
    about = "Locate a chessboard in a screenshot, read its pieces and resolve spoken moves"
)]
struct Cli {
    /// JSON config with locator and threshold overrides.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Write the report here instead of stdout.
    #[arg(long, global = true)]
    output: Option<PathBuf>,
    /// Debug logging on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find the board region in a screenshot.
    Locate {
        screenshot: PathBuf,
        #[command(flatten)]
        window: WindowArg,
    },
    /// Learn the pieces from a starting-position screenshot and read a board.
    Detect(DetectArgs),
    /// Resolve a spoken move and print the squares and click points.
    Move {
        #[command(flatten)]
        detect: DetectArgs,
        /// Side believed to be moving.
        #[arg(long, value_enum)]
        color: Side,
        /// Move tokens, e.g. `n c 3`.
        #[arg(required = true, num_args = 1..)]
        tokens: Vec<String>,
    },
}

#[derive(Args, Debug)]
struct WindowArg {
    /// Foreground window as `x,y,w,h`; defaults to the whole screenshot.
    #[arg(long, value_parser = parse_window)]
    window: Option<ScreenRect>,
}

#[derive(Args, Debug)]
struct DetectArgs {
    /// Screenshot of the board in the starting position.
    #[arg(long)]
    reference: PathBuf,
    /// Screenshot to read; defaults to the reference screenshot.
    #[arg(long)]
    image: Option<PathBuf>,
    /// Side rendered at the bottom of the screen.
    #[arg(long, value_enum, default_value_t = Side::White)]
    orientation: Side,
    #[command(flatten)]
    window: WindowArg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Side {
    White,
    Black,
}

impl Side {
    fn orientation(self) -> Orientation {
        match self {
            Side::White => Orientation::Normal,
            Side::Black => Orientation::Flipped,
        }
    }

    fn color(self) -> PieceColor {
        match self {
            Side::White => PieceColor::White,
            Side::Black => PieceColor::Black,
        }
    }
}

fn parse_window(s: &str) -> Result<ScreenRect, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [x, y, w, h] = parts.as_slice() else {
        return Err(format!("expected x,y,w,h, got {s:?}"));
    };
    let num = |v: &str| v.parse::<i64>().map_err(|e| format!("{v:?}: {e}"));
    let (x, y, w, h) = (num(x)?, num(y)?, num(w)?, num(h)?);
    let coord = |v: i64| i32::try_from(v).map_err(|e| e.to_string());
    let size = |v: i64| u32::try_from(v).map_err(|e| e.to_string());
    Ok(ScreenRect::new(coord(x)?, coord(y)?, size(w)?, size(h)?))
}

type Session = ChessGridSession<StillImageScreen, ClickRecorder>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => match ChessGridConfig::load_json(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                eprintln!("failed to load config {}: {err}", path.display());
                return ExitCode::from(2);
            }
        },
        None => ChessGridConfig::default(),
    };

    let report = match run(&cli.command, config) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };

    let written = match &cli.output {
        Some(path) => report.write_json(path).map_err(|e| e.to_string()),
        None => serde_json::to_string_pretty(&report)
            .map(|json| println!("{json}"))
            .map_err(|e| e.to_string()),
    };
    if let Err(err) = written {
        eprintln!("failed to write report: {err}");
        return ExitCode::from(2);
    }

    if report.error.is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Errors inside the session end up in the report; only I/O errors escape.
fn run(
    command: &Command,
    config: ChessGridConfig,
) -> Result<DetectionReport, Box<dyn std::error::Error>> {
    match command {
        Command::Locate { screenshot, window } => {
            let mut session = open_session(screenshot, window, config)?;
            let mut report = DetectionReport::new(screenshot, session.orientation());
            match session.locate_board() {
                Ok(region) => report.region = Some(region),
                Err(err) => report.set_error(err),
            }
            Ok(report)
        }
        Command::Detect(args) => {
            let (_, report) = detect(args, config)?;
            Ok(report)
        }
        Command::Move {
            detect: args,
            color,
            tokens,
        } => {
            let (session, mut report) = detect(args, config)?;
            let Some(mut session) = session else {
                return Ok(report);
            };
            session.pointer_mut().take();
            match session.apply_move(tokens.as_slice(), color.color()) {
                Ok(m) => report.mv = Some(MoveReport::new(&m, session.pointer().clicks())),
                Err(err) => report.set_error(err),
            }
            Ok(report)
        }
    }
}

/// Reference from one screenshot, then read the board from the other.
///
/// The session is returned only if a position was detected.
fn detect(
    args: &DetectArgs,
    config: ChessGridConfig,
) -> Result<(Option<Session>, DetectionReport), Box<dyn std::error::Error>> {
    let orientation = args.orientation.orientation();
    let mut session = open_session(&args.reference, &args.window, config)?;
    let image_path = args.image.as_deref().unwrap_or(&args.reference);
    let mut report = DetectionReport::new(image_path, orientation);

    if let Err(err) = session.build_reference(orientation) {
        if let SessionError::ReferenceDetection { failures } = &err {
            report.set_reference_failures(failures);
        }
        report.region = session.phase().region();
        report.set_error(err);
        return Ok((None, report));
    }
    report.region = session.phase().region();

    if let Some(path) = &args.image {
        session.capture_mut().set_image(image::open(path)?.to_rgba8());
    }
    match session.detect() {
        Ok(position) => {
            report.set_position(position.fen(), &position.render(orientation));
            Ok((Some(session), report))
        }
        Err(err) => {
            report.set_error(err);
            Ok((None, report))
        }
    }
}

fn open_session(
    screenshot: &Path,
    window: &WindowArg,
    config: ChessGridConfig,
) -> Result<Session, Box<dyn std::error::Error>> {
    let mut screen = StillImageScreen::open(screenshot)?;
    if let Some(rect) = window.window {
        screen = screen.with_window(rect);
    }
    Ok(ChessGridSession::new(screen, ClickRecorder::new(), config))
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    #[cfg(feature = "tracing")]
    {
        let _ = tracing_log::LogTracer::init();
        let filter = tracing_subscriber::EnvFilter::try_from_env(chess_grid::core::LOG_ENV_VAR)
            .unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(level.to_string().to_lowercase())
            });
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    #[cfg(not(feature = "tracing"))]
    {
        let _ = chess_grid::core::init_from_env(level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_argument_parses() {
        assert_eq!(
            parse_window("10, 20,300,400").expect("window"),
            ScreenRect::new(10, 20, 300, 400)
        );
        assert!(parse_window("1,2,3").is_err());
        assert!(parse_window("1,2,-3,4").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
