mod bridge;
mod render;

use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use engine::import::{NameFormat, parse_names};
use engine::{Command, CueMode, Engine, Event, GridConfig, Pacing, PlayheadStyle};
use tracing::{info, warn};

const PROGRESS_WIDTH: usize = 40;

#[derive(Parser, Debug)]
#[command(name = "opengrid")]
#[command(about = "Cue tables and timed playheads for group improvisation")]
struct Cli {
    /// TOML file with startup settings; flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Fill a cue table and print it
    Table {
        #[command(flatten)]
        table: TableArgs,

        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,

        /// Mark one changing player per column
        #[arg(long)]
        cues: bool,
    },
    /// Print the per-column duration plan
    Plan {
        #[arg(long)]
        columns: Option<usize>,

        /// Piece length in seconds
        #[arg(long)]
        duration: Option<u32>,

        #[arg(long, value_enum)]
        pacing: Option<PacingArg>,

        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the names parsed from a file
    Names { file: PathBuf },
    /// Fill a table and run the timed playhead until the piece ends
    Perform {
        #[command(flatten)]
        table: TableArgs,

        #[arg(long, value_enum)]
        style: Option<StyleArg>,
    },
}

#[derive(clap::Args, Debug)]
struct TableArgs {
    /// Import player names from this file
    #[arg(long)]
    names: Option<PathBuf>,

    #[arg(long)]
    columns: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,
}

impl TableArgs {
    fn config(&self) -> GridConfig {
        GridConfig {
            columns: self.columns,
            seed: self.seed,
            ..GridConfig::default()
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum PacingArg {
    Even,
    Uneven,
}

impl From<PacingArg> for Pacing {
    fn from(value: PacingArg) -> Self {
        match value {
            PacingArg::Even => Pacing::Even,
            PacingArg::Uneven => Pacing::Uneven,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum StyleArg {
    Continuous,
    Stepped,
}

impl From<StyleArg> for PlayheadStyle {
    fn from(value: StyleArg) -> Self {
        match value {
            StyleArg::Continuous => PlayheadStyle::Continuous,
            StyleArg::Stepped => PlayheadStyle::Stepped,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let file_config = match cli.config.as_deref() {
        Some(path) => load_config(path)?,
        None => GridConfig::default(),
    };

    match cli.command {
        CliCommand::Table { table, json, cues } => {
            let config = table.config().or(file_config);
            run_table(config, table.names.as_deref(), json, cues)
        }
        CliCommand::Plan {
            columns,
            duration,
            pacing,
            seed,
        } => {
            let flags = GridConfig {
                columns,
                duration_seconds: duration,
                pacing: pacing.map(Pacing::from),
                seed,
                ..GridConfig::default()
            };
            run_plan(flags.or(file_config))
        }
        CliCommand::Names { file } => run_names(&file),
        CliCommand::Perform { table, style } => {
            let flags = GridConfig {
                playhead_style: style.map(PlayheadStyle::from),
                ..table.config()
            };
            run_perform(flags.or(file_config), table.names.as_deref())
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: &Path) -> Result<GridConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: GridConfig = toml::from_str(&text)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    info!(path = %path.display(), "config loaded");
    Ok(config)
}

fn read_names(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read names from {}", path.display()))
}

fn run_table(config: GridConfig, names: Option<&Path>, json: bool, cues: bool) -> Result<()> {
    let mut engine = Engine::with_system_timer(config);
    if let Some(path) = names {
        let text = read_names(path)?;
        if engine.handle_command(Command::ImportNames { text })?.is_empty() {
            warn!(path = %path.display(), "no names found, keeping current roster");
        }
    }
    if cues {
        engine.handle_command(Command::SetCueMode(CueMode::Player))?;
    }
    engine.handle_command(Command::FillTable)?;

    let snapshot = engine.snapshot();
    if json {
        println!("{}", snapshot.to_json_pretty()?);
    } else {
        print!("{}", render::table(&snapshot));
    }
    Ok(())
}

fn run_plan(config: GridConfig) -> Result<()> {
    let engine = Engine::with_system_timer(config);
    print!("{}", render::plan(engine.plan().durations()));
    Ok(())
}

fn run_names(path: &Path) -> Result<()> {
    let parsed = parse_names(&read_names(path)?);
    if parsed.names.is_empty() {
        bail!("no names found in {}", path.display());
    }

    let format = match parsed.format {
        NameFormat::Numbered => "numbered",
        NameFormat::List => "list",
    };
    println!("{} names ({format})", parsed.names.len());
    for name in &parsed.names {
        println!("  {name}");
    }
    Ok(())
}

fn run_perform(config: GridConfig, names: Option<&Path>) -> Result<()> {
    let config = GridConfig {
        cue_mode: Some(CueMode::Timed),
        ..config
    };
    let (command_tx, event_rx) = bridge::spawn_engine_bridge(Engine::with_system_timer(config));

    if let Some(path) = names {
        command_tx
            .send(Command::ImportNames {
                text: read_names(path)?,
            })
            .context("engine thread stopped")?;
    }
    command_tx
        .send(Command::FillTable)
        .context("engine thread stopped")?;
    command_tx
        .send(Command::StartPlayback)
        .context("engine thread stopped")?;

    let mut stdout = std::io::stdout();
    let mut pending_table = None;
    while let Ok(event) = event_rx.recv() {
        match event {
            Event::TableChanged(snapshot) => pending_table = Some(snapshot),
            Event::PlayheadChanged(playhead) => {
                if let Some(snapshot) = pending_table.take() {
                    print!("{}", render::table(&snapshot));
                }
                print!("\r{}", render::progress_line(&playhead, PROGRESS_WIDTH));
                stdout.flush().context("failed to write progress")?;
            }
            Event::PlaybackCompleted => {
                println!();
                return Ok(());
            }
            Event::Error(error) => warn!(kind = ?error.kind, "{}", error.message),
        }
    }

    bail!("engine thread stopped before the piece ended")
}
