mod actions;
mod assets;
mod reports;
mod shell;
mod storage;

use anyhow::{Context, Result, bail};
use cbtracker_game::{
    CatalogIndex, ChallengeTag, ChallengeVisibility, FilterOptions, ProgressStore, StageVisibility,
    TrackerEngine,
};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufRead, BufWriter, Read, Write, stdout};
use std::path::PathBuf;

use assets::CatalogSource;
use storage::FileStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChallengeMode {
    /// Show every challenge, completed or not
    All,
    /// Hide completed challenges
    Incomplete,
}

impl From<ChallengeMode> for ChallengeVisibility {
    fn from(mode: ChallengeMode) -> Self {
        match mode {
            ChallengeMode::All => Self::All,
            ChallengeMode::Incomplete => Self::Incomplete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StageMode {
    /// Only the current stage of each unlocked section
    Next,
    /// Every stage that is not complete
    Incomplete,
}

impl From<StageMode> for StageVisibility {
    fn from(mode: StageMode) -> Self {
        match mode {
            StageMode::Next => Self::Next,
            StageMode::Incomplete => Self::Incomplete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Colored, human-readable output
    Console,
    /// Machine-readable JSON
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "cbtracker", version)]
#[command(about = "Track Conqueror's Blade seasonal challenge progress")]
struct Args {
    /// Challenge catalog JSON (defaults to the bundled catalog)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Manual unlock rules JSON (used together with --catalog)
    #[arg(long, global = true)]
    unlocks: Option<PathBuf>,

    /// Directory holding saved progress
    #[arg(long, global = true, default_value = ".cbtracker")]
    state_dir: PathBuf,

    /// Which challenges to show
    #[arg(long, global = true, value_enum, default_value_t = ChallengeMode::Incomplete)]
    challenges: ChallengeMode,

    /// Which stages to show
    #[arg(long, global = true, value_enum, default_value_t = StageMode::Next)]
    stages: StageMode,

    /// Output report format
    #[arg(long, global = true, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write output instead of stdout
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            challenges: self.challenges.into(),
            stages: self.stages.into(),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// List challenges that are still visible
    List {
        /// Only challenges carrying this tag, e.g. "bandit-raid"
        #[arg(long)]
        tag: Option<ChallengeTag>,
    },
    /// Print the grid filter expression as JSON
    Filter,
    /// Show lock state and stage progress per section
    Sections,
    /// Mark ids complete (season, section, stage or challenge)
    Complete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Clear ids previously marked complete
    Uncomplete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Print saved progress as JSON
    Export,
    /// Replace saved progress with exported JSON ("-" reads stdin)
    Import { source: String },
    /// Erase all saved progress
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
    /// Interactive session with undo
    Shell,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut output_target = OutputTarget::new(args.output.clone())?;
    let stdin = std::io::stdin();
    let result = run(&args, &mut stdin.lock(), &mut output_target);
    output_target.flush_inner()?;
    result
}

fn open_tracker(args: &Args) -> Result<(CatalogIndex, ProgressStore)> {
    let source = CatalogSource::from_paths(args.catalog.clone(), args.unlocks.clone());
    let engine = TrackerEngine::new(source, FileStorage::new(&args.state_dir));
    let index = engine
        .build_index()
        .context("failed to load challenge catalog")?;
    let mut store = engine.open_store().with_context(|| {
        format!(
            "failed to load progress from {}",
            engine.storage().dir().display()
        )
    })?;
    store.set_options(args.filter_options());
    Ok((index, store))
}

fn run(args: &Args, input: &mut dyn BufRead, out: &mut dyn Write) -> Result<()> {
    let (index, mut store) = open_tracker(args)?;

    match &args.command {
        Command::List { tag } => actions::list_challenges(out, &store, &index, *tag, args.report)?,
        Command::Filter => actions::show_filter(out, &store, &index)?,
        Command::Sections => actions::show_sections(out, &store, &index, args.report)?,
        Command::Complete { ids } => {
            let rejected =
                actions::complete_ids(out, &mut store, &index, ids.iter().map(String::as_str))?;
            finish_update(args, out, &store, &rejected)?;
        }
        Command::Uncomplete { ids } => {
            let rejected =
                actions::uncomplete_ids(out, &mut store, &index, ids.iter().map(String::as_str))?;
            finish_update(args, out, &store, &rejected)?;
        }
        Command::Export => writeln!(out, "{}", store.export()?)?,
        Command::Import { source } => {
            let text = if source == "-" {
                let mut text = String::new();
                input
                    .read_to_string(&mut text)
                    .context("failed to read progress from stdin")?;
                text
            } else {
                source.clone()
            };
            store.import(&text).context("failed to import progress")?;
            writeln!(out, "{}", "📥 Progress imported".green())?;
            reports::write_progress_console(out, store.completed())?;
        }
        Command::Reset { yes } => {
            if !yes {
                bail!("refusing to erase all progress without --yes");
            }
            store.reset();
            writeln!(out, "{}", "🧹 All progress erased".yellow())?;
        }
        Command::Shell => shell::run_shell(input, out, &mut store, &index, args.report)?,
    }
    Ok(())
}

fn finish_update(
    args: &Args,
    out: &mut dyn Write,
    store: &ProgressStore,
    rejected: &[String],
) -> Result<()> {
    match args.report {
        ReportFormat::Console => reports::write_progress_console(out, store.completed())?,
        ReportFormat::Json => writeln!(out, "{}", store.export()?)?,
    }
    if !rejected.is_empty() {
        bail!("unrecognized ids: {}", rejected.join(", "));
    }
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
