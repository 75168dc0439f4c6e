//! `pagecraft`: replay an editing script against a visual-editor document.
//!
//! Loads the document (or starts empty), runs each script line through the
//! headless editor, and writes the resulting document JSON to `--output` or
//! stdout. Logs go to `pagecraft.log`; set `RUST_LOG` to choose levels.

mod script;

use anyhow::{Context, Result};
use clap::Parser;
use core_model::{EditorDocument, EditorModel};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

const LOG_FILE: &str = "pagecraft.log";

#[derive(Parser, Debug)]
#[command(name = "pagecraft", version, about = "Replay editing scripts against a visual-editor document")]
struct Args {
    /// Script to replay, one step per line (`-` reads stdin).
    pub script: PathBuf,
    /// Document JSON to start from. An empty container is used if omitted.
    #[arg(long = "document")]
    pub document: Option<PathBuf>,
    /// Optional configuration file path (overrides discovery of `pagecraft.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Where to write the final document JSON. Defaults to stdout.
    #[arg(long = "output")]
    pub output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = configure_logging();
    install_panic_hook();
    info!(target: "runtime", script = %args.script.display(), "startup");

    let result = run(&args);
    if let Err(err) = &result {
        error!(target: "runtime", error = %format!("{err:#}"), "run_failed");
    }
    info!(target: "runtime", ok = result.is_ok(), "shutdown");
    result
}

fn run(args: &Args) -> Result<()> {
    let config = core_config::load_from(args.config.clone())?;
    let mut model = match args.document.as_ref() {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading document {}", path.display()))?;
            let document = EditorDocument::from_json(&text)
                .with_context(|| format!("parsing document {}", path.display()))?;
            EditorModel::new(document, &config)?
        }
        None => EditorModel::empty(&config)?,
    };

    let source = read_script(&args.script)?;
    let steps = script::parse(&source)?;
    let stdout = io::stdout();
    script::execute(&mut model, &steps, &mut stdout.lock())?;

    let json = model.export_json()?;
    match args.output.as_ref() {
        Some(path) => std::fs::write(path, json + "\n")
            .with_context(|| format!("writing {}", path.display()))?,
        None => {
            let mut out = stdout.lock();
            writeln!(out, "{json}")?;
        }
    }
    Ok(())
}

fn read_script(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        return Ok(io::read_to_string(io::stdin())?);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading script {}", path.display()))
}

fn configure_logging() -> Option<WorkerGuard> {
    let log_dir = Path::new(".");
    let log_path = log_dir.join(LOG_FILE);
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_ansi(false)
        .with_writer(nb_writer)
        .try_init()
    {
        Ok(()) => Some(guard),
        // Global subscriber already installed; drop the guard so the writer shuts down.
        Err(_) => None,
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}
