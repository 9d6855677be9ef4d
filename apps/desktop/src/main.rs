use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    ActionOutcome, Celebration, CelebrationOptions, ElementId, FilePreferenceStore, HeadlessDom,
    HttpClassificationApi, SelectedFile, UiController,
};
use shared::domain::Theme;
use tracing_subscriber::EnvFilter;

const PREFERENCES_FILE: &str = "preferences.json";

#[derive(Parser, Debug)]
#[command(name = "ticket-classifier", about = "Classify support tickets against a running server")]
struct Args {
    #[arg(long, env = "TICKET_SERVER_URL", default_value = "http://127.0.0.1:8000")]
    server_url: String,
    /// Directory holding preferences; defaults to the per-user data dir.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a single ticket.
    Classify { text: Vec<String> },
    /// Classify every row of a CSV file with a `text` column.
    ClassifyFile { path: Option<PathBuf> },
    /// Show or flip the stored light/dark preference.
    Theme {
        #[arg(long)]
        toggle: bool,
    },
}

struct TerminalCelebration;

impl Celebration for TerminalCelebration {
    fn celebrate(&self, options: &CelebrationOptions) {
        let width = (options.spread / 10).max(1) as usize;
        println!("{}", "🎉".repeat(width));
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let data_dir = match args.data_dir {
        Some(dir) => dir,
        None => dirs::data_local_dir()
            .ok_or_else(|| anyhow!("unable to resolve local app data dir"))?
            .join("ticket_classifier"),
    };
    let dom = Arc::new(HeadlessDom::new());
    let api = HttpClassificationApi::new(&args.server_url)
        .with_context(|| format!("invalid --server-url '{}'", args.server_url))?;
    let controller = UiController::new(
        Arc::new(api),
        dom.clone(),
        Arc::new(FilePreferenceStore::open(data_dir.join(PREFERENCES_FILE))),
    )
    .with_celebration(Arc::new(TerminalCelebration));
    let theme = controller.init();

    let outcome = match args.command {
        Command::Classify { text } => {
            dom.set_value(ElementId::TicketText, text.join(" "));
            controller.classify_ticket().await
        }
        Command::ClassifyFile { path } => {
            if let Some(path) = path {
                dom.select_files(ElementId::FileInput, vec![read_selected_file(&path)?]);
            }
            controller.classify_file().await
        }
        Command::Theme { toggle } => {
            let theme = if toggle { controller.toggle_theme() } else { theme };
            println!("{}", describe_theme(theme));
            ActionOutcome::Completed
        }
    };

    for alert in dom.take_alerts() {
        eprintln!("{alert}");
    }
    for line in render_panels(&dom) {
        println!("{line}");
    }

    Ok(ExitCode::from(exit_status(&outcome)))
}

/// Failures were already alerted on stderr, so only the status reports them.
fn exit_status(outcome: &ActionOutcome) -> u8 {
    match outcome {
        ActionOutcome::Failed(_) => 1,
        ActionOutcome::Skipped | ActionOutcome::Completed => 0,
    }
}

fn read_selected_file(path: &Path) -> Result<SelectedFile> {
    let contents =
        fs::read(path).with_context(|| format!("failed to read '{}'", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "tickets.csv".to_string());
    Ok(SelectedFile { name, contents })
}

fn describe_theme(theme: Theme) -> String {
    format!("{} theme {}", theme.toggle_icon(), theme)
}

/// Text of every result panel the last action revealed.
fn render_panels(dom: &HeadlessDom) -> Vec<String> {
    let mut lines = Vec::new();
    if !dom.is_hidden(ElementId::Result) {
        lines.push(format!(
            "Category: {}",
            dom.text(ElementId::Category).unwrap_or_default()
        ));
        lines.push(format!(
            "Assigned team: {}",
            dom.text(ElementId::Team).unwrap_or_default()
        ));
    }
    if !dom.is_hidden(ElementId::FileResult) {
        lines.extend(dom.text(ElementId::FileResult));
    }
    lines
}
