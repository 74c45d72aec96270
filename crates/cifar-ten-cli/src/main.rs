// crates/cifar-ten-cli/src/main.rs
// ============================================================================
// Module: CIFAR-Ten CLI Entry Point
// Description: Command dispatcher for fetching, inspecting, and previewing data.
// Purpose: Provide a scriptable front end over the cifar-ten library.
// Dependencies: clap, cifar-ten, cifar-ten-config, serde, serde_json, thiserror.
// ============================================================================

//! ## Overview
//! The `cifar-ten` binary loads `cifar-ten.toml` (or release defaults), then
//! fetches the archive, summarizes both splits, or renders a single record.
//! Results go to stdout; progress records go to stderr as JSON lines unless
//! `--quiet` is set. All user-facing strings are routed through the message
//! catalog.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use cifar_ten::Cifar10;
use cifar_ten::Class;
use cifar_ten::FetchOutcome;
use cifar_ten::LabelEncoding;
use cifar_ten::LogReporter;
use cifar_ten::SplitData;
use cifar_ten::SplitKind;
use cifar_ten::preview::random_index;
use cifar_ten::preview::write_ppm;
use cifar_ten_cli::t;
use cifar_ten_config::CifarTenConfig;
use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde::Serialize;
use thiserror::Error;

/// Component name attached to progress records.
const REPORT_COMPONENT: &str = "cifar-ten-cli";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "cifar-ten", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Config file path (overrides `CIFAR_TEN_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Suppress progress records on stderr.
    #[arg(long, short = 'q', action = ArgAction::SetTrue, global = true)]
    quiet: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Download and extract the binary release unless already present.
    Fetch(FetchCommand),
    /// Parse both splits and print a JSON summary.
    Inspect(InspectCommand),
    /// Write one record as a PPM image and print its label.
    Preview(PreviewCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Data location overrides shared by data commands.
#[derive(Args, Debug, Clone, Default)]
struct DataArgs {
    /// Base directory holding the archive and extracted batches.
    #[arg(long, value_name = "DIR")]
    base_path: Option<PathBuf>,
}

/// Arguments for `fetch`.
#[derive(Args, Debug)]
struct FetchCommand {
    /// Data location overrides.
    #[command(flatten)]
    data: DataArgs,
}

/// Arguments for `inspect`.
#[derive(Args, Debug)]
struct InspectCommand {
    /// Data location overrides.
    #[command(flatten)]
    data: DataArgs,
    /// Fetch the release before parsing.
    #[arg(long, action = ArgAction::SetTrue)]
    fetch: bool,
}

/// Arguments for `preview`.
#[derive(Args, Debug)]
struct PreviewCommand {
    /// Data location overrides.
    #[command(flatten)]
    data: DataArgs,
    /// Split to read the record from.
    #[arg(long, value_enum, default_value_t = SplitArg::Test)]
    split: SplitArg,
    /// Record index; a random record is chosen when omitted.
    #[arg(long, value_name = "N")]
    index: Option<usize>,
    /// Output file (defaults to `preview-<split>.ppm` under the base path).
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Upscale factor (defaults to `preview.scale`).
    #[arg(long, value_name = "FACTOR")]
    scale: Option<usize>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate the configuration.
    Check,
}

/// Split selector.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum SplitArg {
    /// Training split.
    Train,
    /// Test split.
    Test,
}

impl From<SplitArg> for SplitKind {
    fn from(value: SplitArg) -> Self {
        match value {
            SplitArg::Train => Self::Train,
            SplitArg::Test => Self::Test,
        }
    }
}

// ============================================================================
// SECTION: Output Types
// ============================================================================

/// JSON summary printed by `fetch`.
#[derive(Debug, Serialize, PartialEq, Eq)]
struct FetchSummary {
    /// Archive location.
    archive: String,
    /// Batch directory.
    data_dir: String,
    /// True when this run downloaded the archive.
    downloaded: bool,
    /// True when this run extracted the archive.
    extracted: bool,
}

impl From<FetchOutcome> for FetchSummary {
    fn from(outcome: FetchOutcome) -> Self {
        Self {
            archive: outcome.archive.display().to_string(),
            data_dir: outcome.data_dir.display().to_string(),
            downloaded: outcome.downloaded,
            extracted: outcome.extracted,
        }
    }
}

/// JSON summary printed by `inspect`.
#[derive(Debug, Serialize, PartialEq, Eq)]
struct InspectSummary {
    /// Training split summary.
    train: SplitSummary,
    /// Test split summary.
    test: SplitSummary,
}

/// Record and class counts of one split.
#[derive(Debug, Serialize, PartialEq, Eq)]
struct SplitSummary {
    /// Decoded records.
    records: usize,
    /// Image tensor shape.
    image_shape: [usize; 4],
    /// Label row layout.
    label_encoding: &'static str,
    /// Records per class in class-index order.
    class_counts: Vec<ClassCount>,
}

/// Record count for a single class.
#[derive(Debug, Serialize, PartialEq, Eq)]
struct ClassCount {
    /// Class name.
    class: Class,
    /// Records labelled with the class.
    count: usize,
}

impl SplitSummary {
    /// Summarizes a decoded split.
    fn from_split(split: &SplitData) -> Self {
        let counts = split.labels.class_counts();
        Self {
            records: split.images.records(),
            image_shape: split.images.shape(),
            label_encoding: match split.labels.encoding() {
                LabelEncoding::OneHot => "one_hot",
                LabelEncoding::Index => "index",
            },
            class_counts: Class::ALL
                .iter()
                .zip(counts)
                .map(|(class, count)| ClassCount {
                    class: *class,
                    count,
                })
                .collect(),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for catalog messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a catalog message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    let context = CommandContext {
        config_path: cli.config,
        quiet: cli.quiet,
    };
    match command {
        Commands::Fetch(command) => command_fetch(&context, &command),
        Commands::Inspect(command) => command_inspect(&context, &command),
        Commands::Preview(command) => command_preview(&context, &command),
        Commands::Config {
            command,
        } => match command {
            ConfigCommand::Check => command_config_check(&context),
        },
    }
}

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Command Context
// ============================================================================

/// Global options shared by every command.
struct CommandContext {
    /// Explicit config path.
    config_path: Option<PathBuf>,
    /// Suppress progress records.
    quiet: bool,
}

impl CommandContext {
    /// Loads the configuration, falling back to defaults when no file exists.
    fn load_config(&self) -> CliResult<CifarTenConfig> {
        CifarTenConfig::load_or_default(self.config_path.as_deref())
            .map_err(|err| CliError::new(t!("config.load_failed", error = err)))
    }

    /// Builds the data set builder with CLI overrides and reporting applied.
    fn builder(&self, config: &CifarTenConfig, data: &DataArgs) -> Cifar10 {
        let mut builder = config.to_builder();
        if let Some(base_path) = &data.base_path {
            builder = builder.base_path(base_path);
        }
        if !self.quiet {
            builder = builder
                .reporter(LogReporter::with_component(std::io::stderr(), REPORT_COMPONENT));
        }
        builder
    }
}

// ============================================================================
// SECTION: Data Commands
// ============================================================================

/// Executes `fetch`.
fn command_fetch(context: &CommandContext, command: &FetchCommand) -> CliResult<ExitCode> {
    let config = context.load_config()?;
    let outcome = context
        .builder(&config, &command.data)
        .fetch()
        .map_err(|err| CliError::new(t!("fetch.failed", error = err)))?;
    write_json(&FetchSummary::from(outcome), "fetch summary")?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `inspect`.
fn command_inspect(context: &CommandContext, command: &InspectCommand) -> CliResult<ExitCode> {
    let config = context.load_config()?;
    let mut builder = context.builder(&config, &command.data);
    if command.fetch {
        builder = builder.download_and_extract(true);
    }
    let dataset =
        builder.build().map_err(|err| CliError::new(t!("inspect.failed", error = err)))?;
    let summary = InspectSummary {
        train: SplitSummary::from_split(&dataset.train),
        test: SplitSummary::from_split(&dataset.test),
    };
    write_json(&summary, "inspect summary")?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `preview`.
fn command_preview(context: &CommandContext, command: &PreviewCommand) -> CliResult<ExitCode> {
    let config = context.load_config()?;
    let kind = SplitKind::from(command.split);
    let builder = context.builder(&config, &command.data).show_images(false);
    let split = builder.load_split(kind).map_err(|err| {
        CliError::new(t!("preview.load_failed", split = kind, error = err))
    })?;

    let index = select_index(&split, kind, command.index)?;
    let output = command.output.clone().unwrap_or_else(|| builder.preview_path(kind));
    let scale = command.scale.unwrap_or(config.preview.scale);
    write_ppm(&split.images, index, scale, &output)
        .map_err(|err| CliError::new(t!("preview.render_failed", error = err)))?;
    let label = split
        .labels
        .class_of(index)
        .ok_or_else(|| CliError::new(t!("preview.missing_label", index = index)))?;

    write_stdout_line(&t!(
        "preview.written",
        split = kind,
        index = index,
        label = label,
        path = output.display()
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Resolves the record to preview, validating explicit indices.
fn select_index(split: &SplitData, kind: SplitKind, index: Option<usize>) -> CliResult<usize> {
    let records = split.images.records();
    if records == 0 {
        return Err(CliError::new(t!("preview.empty", split = kind)));
    }
    match index {
        Some(index) if index < records => Ok(index),
        Some(index) => Err(CliError::new(t!(
            "preview.index_out_of_range",
            index = index,
            split = kind,
            records = records
        ))),
        None => random_index(&split.images)
            .map_err(|err| CliError::new(t!("preview.render_failed", error = err))),
    }
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Executes `config check`.
fn command_config_check(context: &CommandContext) -> CliResult<ExitCode> {
    let _config = CifarTenConfig::load(context.config_path.as_deref())
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    write_stdout_line(&t!("config.check.ok"))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes pretty-printed JSON to stdout.
fn write_json<T: Serialize>(value: &T, what: &str) -> CliResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(t!("output.serialize_failed", what = what, error = err)))?;
    write_stdout_line(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
