//! Command-line stroke collector.

mod capture;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use sketchrec_core::{CollectorSettings, StorageError, Workspace};
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "sr-collect", version, about = "Collect, inspect and convert stroke workspaces")]
struct Cli {
    /// Settings file (defaults to the user config directory).
    #[arg(long, global = true, env = "SKETCHREC_SETTINGS")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Read a point stream and save it as a workspace directory.
    Capture {
        /// Point stream to read instead of stdin.
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Workspace directory to save into.
        dir: Option<PathBuf>,
    },
    /// Summarize the canvases and strokes in a workspace directory.
    Info {
        /// Workspace directory to load.
        dir: Option<PathBuf>,
    },
    /// Write a workspace directory out as a JSON snapshot.
    Export {
        /// Workspace directory to load.
        dir: Option<PathBuf>,
        /// JSON file to write.
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Save a JSON snapshot as a workspace directory.
    Import {
        /// JSON snapshot to read.
        snapshot: PathBuf,
        /// Workspace directory to save into.
        dir: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::info!("Starting sr-collect");

    let cli = Cli::parse();
    let settings = load_settings(cli.settings.as_deref())?;

    match cli.command {
        Command::Capture { input, dir } => {
            let dir = workspace_dir(dir, &settings)?;
            let mut workspace = Workspace::with_settings(&settings);
            let summary = match input {
                Some(path) => {
                    let file = File::open(&path)
                        .with_context(|| format!("opening point stream {}", path.display()))?;
                    capture::capture(BufReader::new(file), &mut workspace)?
                }
                None => capture::capture(io::stdin().lock(), &mut workspace)?,
            };
            let written = save(&mut workspace, &dir)?;
            println!(
                "Captured {} points in {} strokes; wrote {} files to {}",
                summary.points,
                summary.strokes,
                written,
                dir.display()
            );
        }
        Command::Info { dir } => {
            let dir = workspace_dir(dir, &settings)?;
            let workspace = open(&dir)?;
            print_info(&workspace, &dir);
        }
        Command::Export { dir, out } => {
            let dir = workspace_dir(dir, &settings)?;
            let workspace = open(&dir)?;
            let json = workspace.to_json().context("serializing workspace")?;
            fs::write(&out, json).with_context(|| format!("writing {}", out.display()))?;
            println!(
                "Exported {} strokes from {} to {}",
                workspace.stroke_count(),
                dir.display(),
                out.display()
            );
        }
        Command::Import { snapshot, dir } => {
            let dir = workspace_dir(dir, &settings)?;
            let json = fs::read_to_string(&snapshot)
                .with_context(|| format!("reading {}", snapshot.display()))?;
            let mut workspace = Workspace::from_json(&json)
                .with_context(|| format!("parsing snapshot {}", snapshot.display()))?;
            workspace.apply_settings(&settings);
            let written = save(&mut workspace, &dir)?;
            println!("Imported {} strokes into {}", written, dir.display());
        }
    }
    Ok(())
}

fn load_settings(explicit: Option<&Path>) -> anyhow::Result<CollectorSettings> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match CollectorSettings::default_path() {
            Some(path) => path,
            None => {
                log::warn!("No config directory available, using default settings");
                return Ok(CollectorSettings::default());
            }
        },
    };
    CollectorSettings::load(&path).with_context(|| format!("loading settings from {}", path.display()))
}

fn workspace_dir(dir: Option<PathBuf>, settings: &CollectorSettings) -> anyhow::Result<PathBuf> {
    match dir.or_else(|| settings.workspace_dir.clone()) {
        Some(dir) => Ok(dir),
        None => bail!("no workspace directory given and none configured in settings"),
    }
}

fn open(dir: &Path) -> anyhow::Result<Workspace> {
    Workspace::open(dir).with_context(|| format!("loading workspace {}", dir.display()))
}

fn save(workspace: &mut Workspace, dir: &Path) -> anyhow::Result<usize> {
    match workspace.save_to(dir) {
        Ok(written) => Ok(written),
        Err(StorageError::PathConflict(path)) => {
            bail!("{} is a file; choose another location", path.display())
        }
        Err(e) => Err(e).with_context(|| format!("saving workspace to {}", dir.display())),
    }
}

fn print_info(workspace: &Workspace, dir: &Path) {
    println!(
        "{}: {} canvases, {} strokes",
        dir.display(),
        workspace.canvas_count(),
        workspace.stroke_count()
    );
    for (i, canvas) in workspace.canvases().iter().enumerate() {
        println!(
            "  canvas {i:02} '{}': {} strokes, {} points",
            canvas.name(),
            canvas.len(),
            canvas.point_count()
        );
        for (j, stroke) in canvas.strokes().iter().enumerate() {
            match stroke.bounds() {
                Some(b) => println!(
                    "    stroke {j:03}: {} points, box ({}, {})-({}, {})",
                    stroke.len(),
                    b.min_x,
                    b.min_y,
                    b.max_x,
                    b.max_y
                ),
                None => println!("    stroke {j:03}: empty"),
            }
        }
    }
}
