use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use pdf_annotator_core::{AnnotationSnapshot, ToolState};
use pdf_annotator_viewer::{SearchController, SearchState, ViewState, Viewer, ViewerConfig, ViewerEffect, ViewerEvent};
use pdf_engine::DocumentSource;
use serde::{Deserialize, Serialize};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Parser)]
#[command(name = "pdf-annotator")]
#[command(about = "Headless driver for the PDF annotation viewer")]
pub struct Cli {
    /// Log to stderr: -v for debug, -vv for trace.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print page count and page sizes as JSON.
    Info {
        /// A PDF, or a `.json` page description.
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print the pages containing QUERY (case-insensitive) as JSON.
    Search {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(value_name = "QUERY")]
        query: String,
    },
    /// Feed a timed event script through the viewer and print the final state.
    Replay {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long, value_name = "EVENTS_JSON")]
        script: PathBuf,
        #[arg(long, value_name = "VIEWER_TOML")]
        config: Option<PathBuf>,
        /// Also write the annotation snapshot to this file.
        #[arg(long, value_name = "PATH")]
        annotations_out: Option<PathBuf>,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    path: String,
    page_count: u32,
    pages: Vec<PageSizeOutput>,
}

#[derive(Debug, Serialize)]
struct PageSizeOutput {
    page: u32,
    width: f32,
    height: f32,
}

#[derive(Debug, Serialize)]
struct SearchOutput {
    query: String,
    matches: Vec<u32>,
}

/// One scripted event, delivered `at_ms` after the replay starts.
#[derive(Debug, Deserialize)]
struct ScriptStep {
    at_ms: u64,
    event: ViewerEvent,
}

#[derive(Debug, Serialize)]
struct ReplayOutput {
    page_count: u32,
    view: ViewState,
    tools: ToolState,
    search: SearchState,
    effects: Vec<ViewerEffect>,
    annotations: AnnotationSnapshot,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info { file } => run_info(&file),
        Commands::Search { file, query } => run_search(&file, &query),
        Commands::Replay { file, script, config, annotations_out } => {
            run_replay(&file, &script, config.as_deref(), annotations_out.as_deref())
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    // Fails only if a logger is already installed, which is fine.
    let _ = TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Never);
}

fn open_document(file: &Path) -> Result<Box<dyn DocumentSource>> {
    ensure_file_exists(file)?;
    pdf_engine::open_path(file).context("failed to open document")
}

fn run_info(file: &Path) -> Result<()> {
    let document = open_document(file)?;

    let pages = (1..=document.page_count())
        .map(|page| {
            let size = document.page_size(page)?;
            Ok(PageSizeOutput { page, width: size.width_pt, height: size.height_pt })
        })
        .collect::<Result<Vec<_>>>()?;

    let payload = InfoOutput { path: file.display().to_string(), page_count: document.page_count(), pages };
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn run_search(file: &Path, query: &str) -> Result<()> {
    let document = open_document(file)?;

    let mut search = SearchController::new(Duration::ZERO);
    let state = search.search(document.as_ref(), query);

    let payload = SearchOutput { query: query.to_string(), matches: state.matches.clone() };
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ViewerConfig> {
    let config = match path {
        Some(path) => ViewerConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => {
            let default_path = ViewerConfig::default_config_path();
            if default_path.is_file() {
                log::info!("using config {}", default_path.display());
                ViewerConfig::from_file(&default_path)
                    .with_context(|| format!("failed to load config {}", default_path.display()))?
            } else {
                ViewerConfig::default()
            }
        }
    };
    Ok(config.overlay_env()?)
}

fn run_replay(
    file: &Path,
    script: &Path,
    config: Option<&Path>,
    annotations_out: Option<&Path>,
) -> Result<()> {
    let config = load_config(config)?;
    let settle_after = config.search_debounce() + config.scroll_throttle();

    let raw = fs::read_to_string(script)
        .with_context(|| format!("failed to read script {}", script.display()))?;
    let steps: Vec<ScriptStep> = serde_json::from_str(&raw).context("invalid event script")?;

    let document = open_document(file)?;
    let mut viewer = Viewer::new(config)?;
    viewer.open(document)?;

    let start = Instant::now();
    let mut effects = Vec::new();
    let mut last = start;

    for step in steps {
        let now = start + Duration::from_millis(step.at_ms);
        last = last.max(now);
        deliver(&mut viewer, step.event, last, &mut effects);
    }
    deliver(&mut viewer, ViewerEvent::Tick, last + settle_after, &mut effects);

    if let Some(path) = annotations_out {
        fs::write(path, viewer.export_annotations_json()?)
            .with_context(|| format!("failed to write annotations to {}", path.display()))?;
    }

    let payload = ReplayOutput {
        page_count: viewer.page_count(),
        view: viewer.view(),
        tools: viewer.tools(),
        search: viewer.search_state().clone(),
        effects,
        annotations: viewer.export_annotations(),
    };
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

/// Acts as the host: scroll requests are carried out immediately and
/// reported back as a settled scroll.
fn deliver(viewer: &mut Viewer, event: ViewerEvent, now: Instant, effects: &mut Vec<ViewerEffect>) {
    for effect in viewer.handle(event, now) {
        let scroll = match &effect {
            ViewerEffect::ScrollTo { offset_px, .. } => Some(*offset_px),
            _ => None,
        };
        effects.push(effect);
        if let Some(offset_px) = scroll {
            effects.extend(viewer.handle(ViewerEvent::Scroll { offset_px }, now));
            effects.extend(viewer.handle(ViewerEvent::ScrollSettled, now));
        }
    }
}

fn ensure_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}
