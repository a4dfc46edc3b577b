//! Photo Resequencer - renumber and re-date photo folders
//!
//! Command line front-end for the batch job, the single-photo editor and
//! the metadata viewer.

use anyhow::{Context, Result};
use clap::Parser;
use photo_resequencer::cli::{Command, EditArgs};
use photo_resequencer::config::LOG_FILE_NAME;
use photo_resequencer::metadata::{MetadataField, format_exif_datetime, read_snapshot};
use photo_resequencer::{BatchJob, Cli, Config, Reporter, Severity, edit_image};
use std::path::{Path, PathBuf};
use tracing::{Level, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cli_output {
    //! Coloured console output for progress events and summaries

    use crossterm::{
        ExecutableCommand,
        style::{Color, Print, Stylize, style},
    };
    use photo_resequencer::{LogEvent, Severity};
    use std::io::stdout;

    /// CLI theme colours
    pub struct CliTheme;

    impl CliTheme {
        pub const SUCCESS: Color = Color::Green;
        pub const WARNING: Color = Color::Yellow;
        pub const ERROR: Color = Color::Red;
        pub const HINT: Color = Color::DarkGrey;
        pub const ACCENT: Color = Color::Cyan;
    }

    pub fn print_separator() {
        let _ = stdout().execute(Print(format!("{}\n", "─".repeat(60))));
    }

    /// Print one progress event, coloured by severity
    pub fn print_event(event: &LogEvent) {
        let color = match event.severity {
            Severity::Debug => CliTheme::HINT,
            Severity::Info => CliTheme::ACCENT,
            Severity::Warning => CliTheme::WARNING,
            Severity::Error => CliTheme::ERROR,
        };
        let stamp = event.timestamp.format("%H:%M:%S").to_string();

        let _ = stdout().execute(Print(style(stamp).with(CliTheme::HINT)));
        let _ = stdout().execute(Print(" "));
        let _ = stdout().execute(Print(
            style(format!("{:<7}", event.severity.as_str())).with(color).bold(),
        ));
        let _ = stdout().execute(Print(format!(" {}\n", event.message)));
    }

    pub fn print_success(msg: &str) {
        let _ = stdout().execute(Print(style("✓ ").with(CliTheme::SUCCESS).bold()));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    pub fn print_warning(msg: &str) {
        let _ = stdout().execute(Print(style("⚠ ").with(CliTheme::WARNING).bold()));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    pub fn print_error(msg: &str) {
        let _ = stdout().execute(Print(style("✗ ").with(CliTheme::ERROR).bold()));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    pub fn print_key_value(key: &str, value: &str, value_color: Option<Color>) {
        let key_styled = style(format!("{:<14}", key)).with(CliTheme::HINT);
        let value_styled = match value_color {
            Some(color) => style(value).with(color),
            None => style(value).bold(),
        };
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(key_styled));
        let _ = stdout().execute(Print(": "));
        let _ = stdout().execute(Print(value_styled));
        let _ = stdout().execute(Print("\n"));
    }

    pub fn print_log_path(path: &str) {
        let _ = stdout().execute(Print(style("  Log file: ").with(CliTheme::HINT)));
        let _ = stdout().execute(Print(format!("{}\n", path)));
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Command::SampleConfig = cli.command {
        print!("{}", Config::sample_config());
        return Ok(());
    }

    let config = load_config(&cli)?;
    let log_dir = match config.log_dir.clone() {
        Some(dir) => dir,
        None => get_executable_dir()?.join("Log"),
    };
    let _guard = setup_logging(&config, &log_dir)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Photo Resequencer starting"
    );
    if config.verbose {
        info!(?config, "Configuration loaded");
    }

    let reporter = console_reporter(config.verbose);
    let outcome = match &cli.command {
        Command::Run(_) => run_batch(&config, reporter),
        Command::Edit(args) => run_edit(args, &reporter),
        Command::Show { file } => show_metadata(file),
        Command::SampleConfig => Ok(()),
    };

    if let Err(e) = outcome {
        error!(error = %e, "Command failed");
        cli_output::print_error(&format!("{:#}", e));
        cli_output::print_log_path(&log_dir.join(LOG_FILE_NAME).display().to_string());
        std::process::exit(1);
    }

    Ok(())
}

/// Reporter that prints every event to the console
fn console_reporter(verbose: bool) -> Reporter {
    Reporter::from_fn(move |event| {
        if verbose || event.severity > Severity::Debug {
            cli_output::print_event(event);
        }
    })
}

fn run_batch(config: &Config, reporter: Reporter) -> Result<()> {
    let root = config
        .root_dir
        .clone()
        .context("No root directory given (use --root or root_dir in the config file)")?;

    let mut job = BatchJob::new(root, config.target_folder.clone()).with_reporter(reporter);
    if let Some(seed) = config.seed {
        job = job.with_seed(seed);
    }

    if config.dry_run {
        let plans = job.plan_all()?;
        println!("{}", serde_json::to_string_pretty(&plans)?);
        cli_output::print_warning("Dry run: no files were renamed or retagged");
        return Ok(());
    }

    // Ctrl+C finishes the current file and stops before the next one
    let token = job.cancel_token();
    ctrlc::set_handler(move || {
        cli_output::print_warning("Ctrl+C detected, stopping after the current file...");
        token.cancel();
    })
    .context("Failed to install Ctrl+C handler")?;

    let folders = job.run()?;
    let stats = job.stats();

    cli_output::print_separator();
    if folders == 0 {
        cli_output::print_warning(&format!(
            "No folders named \"{}\" were found",
            config.target_folder
        ));
    } else {
        cli_output::print_success(&stats.summary());
    }
    Ok(())
}

fn run_edit(args: &EditArgs, reporter: &Reporter) -> Result<()> {
    let changes = args.change_set();
    let message = edit_image(&args.file, args.name.as_deref(), changes.as_ref(), reporter)
        .with_context(|| format!("Failed to edit {}", args.file.display()))?;

    info!(file = %args.file.display(), "{}", message);
    cli_output::print_success(&message);
    Ok(())
}

fn show_metadata(file: &Path) -> Result<()> {
    let snapshot = read_snapshot(file)?;

    cli_output::print_separator();
    cli_output::print_key_value(
        "File",
        &file.display().to_string(),
        Some(cli_output::CliTheme::ACCENT),
    );
    for field in MetadataField::ALL {
        match snapshot.get(field) {
            Some(ts) => {
                cli_output::print_key_value(field.as_str(), &format_exif_datetime(&ts), None)
            }
            None => cli_output::print_key_value(
                field.as_str(),
                "(not set)",
                Some(cli_output::CliTheme::HINT),
            ),
        }
    }
    cli_output::print_separator();
    Ok(())
}

/// Get the directory where the executable is located
fn get_executable_dir() -> Result<PathBuf> {
    let exe_path = std::env::current_exe()?;
    Ok(exe_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".")))
}

/// Load configuration from file or CLI arguments
fn load_config(cli: &Cli) -> Result<Config> {
    let config = match cli.config {
        Some(ref config_path) => {
            let file_config = Config::load_from_file(config_path)?;
            cli.merge_with_config(file_config)
        }
        None => cli.to_config(),
    };
    Ok(config)
}

/// Setup logging to the append-only log file
fn setup_logging(config: &Config, log_dir: &Path) -> Result<WorkerGuard> {
    let level = if config.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config.json_log {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
            .init();
    }

    Ok(guard)
}
