//! CLI entry point for `mailnorm`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use mailnorm::config::{Config, ExtractConfig};
use mailnorm::engine::{self, Engine, Format};
use mailnorm::model::message::NormalizedMessage;
use mailnorm::msg::container::{CfbContainer, Container};
use mailnorm::msg::property;
use mailnorm::msg::stream::Variant;

#[derive(Parser)]
#[command(
    name = "mailnorm",
    version,
    about = "Normalize .msg and .eml files into JSON records",
    long_about = "Reads Outlook .msg (OLE compound file) and RFC 5322 .eml messages and prints \
one JSON object per file with the keys from, to, cc, subject, date, attachments and body."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Message file to extract (.msg or .eml)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// String variant used when an MSG property has both (ascii, unicode)
    #[arg(long, global = true, value_name = "VARIANT")]
    prefer: Option<Variant>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the JSON record of one or more files
    Extract {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Indent each record
        #[arg(long)]
        pretty: bool,
    },
    /// Extract every .msg and .eml file of a directory as JSON Lines
    Batch {
        dir: PathBuf,
        /// Write records to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the streams of a .msg container
    Streams {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Save the attachments of a message
    Attachments {
        path: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = mailnorm::config::load_config();
    if let Some(prefer) = cli.prefer {
        config.extract.prefer = prefer;
    }

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.clone(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    setup_logging(&log_level, &config);

    match cli.command {
        Some(Commands::Extract { files, pretty }) => {
            cmd_extract(&files, pretty || config.output.pretty, &config.extract)
        }
        Some(Commands::Batch { dir, output }) => {
            cmd_batch(&dir, output.as_deref(), &config.extract)
        }
        Some(Commands::Streams { path, json }) => cmd_streams(&path, json),
        Some(Commands::Attachments { path, output }) => {
            cmd_attachments(&path, &output, &config.extract)
        }
        Some(Commands::Completions { shell }) => cmd_completions(shell),
        Some(Commands::Manpage) => cmd_manpage(),
        None => match cli.file {
            Some(path) => cmd_extract(&[path], config.output.pretty, &config.extract),
            None => {
                Cli::command().print_help()?;
                Ok(())
            }
        },
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    // Try to set up file logging
    let log_path = mailnorm::config::log_file_path(config);
    let target = log_path.parent().zip(log_path.file_name());
    if let Some((log_dir, file_name)) = target.filter(|(dir, _)| std::fs::create_dir_all(dir).is_ok()) {
        let file_appender = tracing_appender::rolling::never(log_dir, file_name);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "mailnorm", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::stdout().write_all(&buf)?;
    Ok(())
}

fn render(record: &NormalizedMessage, pretty: bool) -> anyhow::Result<String> {
    Ok(if pretty {
        record.to_json_pretty()?
    } else {
        record.to_json()?
    })
}

/// Print one JSON record per input file.
fn cmd_extract(files: &[PathBuf], pretty: bool, options: &ExtractConfig) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for path in files {
        let record = engine::extract_file(path, options)?;
        writeln!(out, "{}", render(&record, pretty)?)?;
    }
    Ok(())
}

/// Supported message files directly inside `dir`, sorted by name.
fn collect_inputs(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && Format::detect(path).is_ok())
        .collect();
    files.sort();
    Ok(files)
}

/// Extract every message file of a directory as JSON Lines.
fn cmd_batch(dir: &Path, output: Option<&Path>, options: &ExtractConfig) -> anyhow::Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Not a directory: {}", dir.display());
    }

    let files = collect_inputs(dir)?;
    let mut sink: Box<dyn Write> = match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            Box::new(std::io::BufWriter::new(std::fs::File::create(path)?))
        }
        None => Box::new(std::io::stdout().lock()),
    };

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Extracting [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let mut failed = 0usize;
    for path in &files {
        match engine::extract_file(path, options) {
            Ok(record) => writeln!(sink, "{}", record.to_json()?)?,
            Err(e) => {
                failed += 1;
                tracing::warn!(path = %path.display(), error = %e, "Skipping file");
            }
        }
        pb.inc(1);
    }
    sink.flush()?;
    pb.finish_and_clear();

    eprintln!(
        "  Extracted {} of {} file(s) in {:.2?}{}",
        files.len() - failed,
        files.len(),
        start.elapsed(),
        if failed > 0 {
            format!(", {failed} failed")
        } else {
            String::new()
        }
    );
    Ok(())
}

/// List every stream of a `.msg` container with its decoded property name.
fn cmd_streams(path: &Path, json: bool) -> anyhow::Result<()> {
    use humansize::{format_size, BINARY};

    let container = CfbContainer::open(path)?;
    let entries = container.list_entries()?;

    let described: Vec<_> = entries
        .iter()
        .map(|entry| {
            let name = entry.segments.last().map(String::as_str).unwrap_or("");
            (entry, property::describe(name))
        })
        .collect();

    if json {
        let items: Vec<serde_json::Value> = described
            .iter()
            .map(|(entry, info)| {
                serde_json::json!({
                    "path": entry.path(),
                    "size": entry.len,
                    "tag": info.as_ref().map(|i| i.tag.clone()),
                    "type": info.as_ref().map(|i| i.kind.name()),
                    "label": info.as_ref().and_then(|i| i.label),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    println!();
    println!("  {:<60} {:>10}  {:<8} Property", "Stream", "Size", "Type");
    println!("  {}", "-".repeat(100));
    for (entry, info) in &described {
        let (kind, label) = match info {
            Some(info) => (info.kind.name(), info.label.unwrap_or("?").to_string()),
            None => (String::new(), String::new()),
        };
        println!(
            "  {:<60} {:>10}  {:<8} {}",
            entry.path(),
            format_size(entry.len, BINARY),
            kind,
            label
        );
    }
    println!();
    println!("  {} stream(s)", described.len());
    Ok(())
}

/// Save the attachments of one message.
fn cmd_attachments(path: &Path, output: &Path, options: &ExtractConfig) -> anyhow::Result<()> {
    let mut engine = Engine::open(path, options)?;
    let attachments = engine.attachments()?;

    if attachments.is_empty() {
        println!("  No attachments found.");
        return Ok(());
    }

    let paths = mailnorm::export::attachment::save_attachments(attachments, output)?;
    println!(
        "  Extracted {} attachment(s) to {}",
        paths.len(),
        output.display()
    );
    Ok(())
}
