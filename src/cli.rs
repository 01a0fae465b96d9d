use anyhow::{Context as _, Result};
use chargeprep::cleaner::TabularCleaner;
use chargeprep::config::CleanerConfig;
use chargeprep::handler::{ErrorResponse, process_upload};
use chargeprep::store::{LocalStore, UploadStore as _};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::io::Write as _;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "chargeprep",
    about = "Turn card-charge CSV exports into numeric feature and label tables"
)]
pub struct Cli {
    /// Also write logs to a daily rolling file in the platform data directory
    #[arg(long, global = true)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean a local CSV file into feature and label tables
    Clean {
        /// Raw CSV export
        #[arg(short, long)]
        input: PathBuf,

        /// Features output path. Defaults to `cleaned_<input name>` next to the input.
        #[arg(long)]
        features_out: Option<PathBuf>,

        /// Labels output path. Defaults to `labels_<input name>` next to the input.
        #[arg(long)]
        labels_out: Option<PathBuf>,

        /// Reference time for the row window (RFC 3339). Defaults to now.
        #[arg(long, value_parser = parse_reference_time)]
        now: Option<DateTime<Utc>>,

        /// Path to a JSON cleaner configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Process a registered upload in the local store and print the JSON response
    Process {
        /// Upload record id
        #[arg(long)]
        id: String,

        /// Store root directory
        #[arg(long, env = "CHARGEPREP_STORE", default_value = "./store")]
        store: PathBuf,

        /// Reference time for the row window (RFC 3339). Defaults to now.
        #[arg(long, value_parser = parse_reference_time)]
        now: Option<DateTime<Utc>>,

        /// Path to a JSON cleaner configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Copy a raw CSV into the local store and create its upload record
    Register {
        /// Raw CSV export
        #[arg(short, long)]
        file: PathBuf,

        /// Owner of the upload
        #[arg(short, long)]
        user: String,

        /// Store root directory
        #[arg(long, env = "CHARGEPREP_STORE", default_value = "./store")]
        store: PathBuf,
    },
    /// Show how column names are routed
    Classify {
        /// Column names to classify
        #[arg(required = true)]
        names: Vec<String>,

        /// Path to a JSON cleaner configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn parse_reference_time(value: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}

fn load_cleaner(config: Option<&Path>) -> Result<TabularCleaner> {
    let config = match config {
        Some(path) => CleanerConfig::from_file(path)?,
        None => CleanerConfig::default(),
    };
    Ok(TabularCleaner::new(config))
}

/// Runs one command. Returns `false` when the command ran but reported a failure.
pub fn run_command(command: Commands) -> Result<bool> {
    match command {
        Commands::Clean {
            input,
            features_out,
            labels_out,
            now,
            config,
        } => handle_clean(
            &input,
            features_out,
            labels_out,
            now.unwrap_or_else(Utc::now),
            config.as_deref(),
        ),
        Commands::Process {
            id,
            store,
            now,
            config,
        } => handle_process(
            &id,
            &store,
            now.unwrap_or_else(Utc::now),
            config.as_deref(),
        ),
        Commands::Register { file, user, store } => handle_register(&file, &user, &store),
        Commands::Classify { names, config } => handle_classify(&names, config.as_deref()),
    }
}

fn sibling_path(input: &Path, prefix: &str) -> Result<PathBuf> {
    let name = input
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid input file name: {}", input.display()))?
        .to_string_lossy();
    Ok(input.with_file_name(format!("{prefix}{name}")))
}

fn handle_clean(
    input: &Path,
    features_out: Option<PathBuf>,
    labels_out: Option<PathBuf>,
    now: DateTime<Utc>,
    config: Option<&Path>,
) -> Result<bool> {
    let cleaner = load_cleaner(config)?;
    let bytes =
        std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let output = cleaner.clean_csv(&bytes, now)?;

    let features_out = match features_out {
        Some(p) => p,
        None => sibling_path(input, "cleaned_")?,
    };
    let labels_out = match labels_out {
        Some(p) => p,
        None => sibling_path(input, "labels_")?,
    };
    std::fs::write(&features_out, &output.features_csv)
        .with_context(|| format!("Failed to write {}", features_out.display()))?;
    std::fs::write(&labels_out, &output.labels_csv)
        .with_context(|| format!("Failed to write {}", labels_out.display()))?;

    for dropped in &output.dropped {
        tracing::warn!(column = %dropped.name, reason = ?dropped.reason, "Column dropped");
    }
    tracing::info!(
        rows = output.rows,
        features = %features_out.display(),
        labels = %labels_out.display(),
        "Wrote cleaned tables"
    );
    Ok(true)
}

fn handle_process(
    id: &str,
    store: &Path,
    now: DateTime<Utc>,
    config: Option<&Path>,
) -> Result<bool> {
    let cleaner = load_cleaner(config)?;
    let store = LocalStore::open(store)?;

    let mut stdout = std::io::stdout().lock();
    match process_upload(&store, &cleaner, id, now) {
        Ok(response) => {
            serde_json::to_writer_pretty(&mut stdout, &response)?;
            writeln!(stdout)?;
            Ok(true)
        }
        Err(err) => {
            let body = ErrorResponse::from(&err);
            tracing::error!(status = body.status, "{}", body.error);
            serde_json::to_writer_pretty(&mut stdout, &body)?;
            writeln!(stdout)?;
            Ok(false)
        }
    }
}

fn handle_register(file: &Path, user: &str, store: &Path) -> Result<bool> {
    let store = LocalStore::open(store)?;
    let bytes = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", file.display()))?
        .to_string_lossy();

    let record = store.register(user, &file_name, &bytes)?;
    writeln!(std::io::stdout().lock(), "{}", record.id)?;
    Ok(true)
}

fn handle_classify(names: &[String], config: Option<&Path>) -> Result<bool> {
    let cleaner = load_cleaner(config)?;
    let mut stdout = std::io::stdout().lock();
    for name in names {
        writeln!(stdout, "{name}\t{}", cleaner.classify(name))?;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reference_time() {
        assert!(parse_reference_time("2024-07-01T00:00:00Z").is_ok());
        assert!(parse_reference_time("July first").is_err());
    }

    #[test]
    fn test_sibling_path() -> Result<()> {
        let path = sibling_path(Path::new("/data/exports/march.csv"), "cleaned_")?;
        assert_eq!(path, PathBuf::from("/data/exports/cleaned_march.csv"));
        Ok(())
    }

    #[test]
    fn test_cli_parses_clean() {
        let cli = Cli::try_parse_from([
            "chargeprep",
            "clean",
            "--input",
            "charges.csv",
            "--now",
            "2024-07-01T00:00:00Z",
        ]);
        assert!(cli.is_ok());
    }
}
