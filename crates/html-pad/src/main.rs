mod script;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use html_pad_config::EditorConfig;
use html_pad_core::{Document, EditingContext};

use crate::script::Session;

/// Replays an editing script against an HTML document through the undo journal.
#[derive(Parser, Debug)]
#[command(name = "html-pad", version, about)]
struct Cli {
    /// HTML document to open.
    file: PathBuf,

    /// Editing script to run, one command per line.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Config file (defaults to `HTML_PAD_CONFIG` or html-pad.json next to the executable).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Save the edited document here instead of printing its body.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(EditorConfig::config_path);
    let config = EditorConfig::load_or_create(&config_path);

    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(&config.log_filter))
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting html-pad");

    let doc = Document::open(&cli.file, &config)?;
    let mut session = Session::new(doc, EditingContext::from_editor_config(&config));

    if let Some(script_path) = &cli.script {
        let script = std::fs::read_to_string(script_path)
            .with_context(|| format!("failed to read script: {}", script_path.display()))?;
        let stdout = std::io::stdout();
        session.run_script(&script, &mut stdout.lock())?;
    }

    match &cli.output {
        Some(output) => session.doc.save_to(output)?,
        None => println!("{}", session.doc.body_html()),
    }
    Ok(())
}
