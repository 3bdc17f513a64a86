mod logging;
mod rule_args;
mod settings;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use datapact_diff::{DiffError, compare, render_report};
use datapact_schema::{LocaleKey, Mode, SchemaError, Synthesizer, contract_json_schema, load_contract};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use logging::{LogFormat, init_logging};
use settings::load_settings;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("settings error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("contract error: {0}")]
    Schema(#[from] SchemaError),
    #[error("diff error: {0}")]
    Diff(#[from] DiffError),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("logging error: {0}")]
    Logging(String),
}

#[derive(Parser, Debug)]
#[command(name = "datapact", version, about = "Data contract generation and structural diffs")]
struct Cli {
    /// Settings file; defaults to ./datapact.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log output format on stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Synthesize a value from a contract declaration.
    Generate(GenerateArgs),
    /// Compare an actual JSON document against an expected one.
    Diff(DiffArgs),
    /// Print the JSON Schema of the contract declaration format.
    Schema,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Contract declaration (JSON).
    contract: PathBuf,
    /// Emit every declared field instead of required ones only.
    #[arg(long, default_value_t = false)]
    full: bool,
    /// RNG seed; overrides the settings file.
    #[arg(long)]
    seed: Option<u64>,
    /// JSON override tree applied after synthesis.
    #[arg(long)]
    overrides: Option<PathBuf>,
    /// Locale for realistic data (en_US, pt_BR).
    #[arg(long)]
    locale: Option<String>,
    /// Number of documents; more than one prints a JSON array.
    #[arg(long, default_value_t = 1)]
    count: usize,
}

#[derive(Args, Debug)]
struct DiffArgs {
    /// Expected JSON document.
    expected: PathBuf,
    /// Actual JSON document.
    actual: PathBuf,
    /// Align sequences by identity before comparing.
    #[arg(long, default_value_t = false)]
    normalize: bool,
    /// Identity key used by normalization; repeatable.
    #[arg(long = "identity-key", value_name = "KEY")]
    identity_keys: Vec<String>,
    /// Per-path rule as PATTERN=RULE[:ARG]; repeatable.
    #[arg(long = "rule", value_name = "SPEC")]
    rules: Vec<String>,
    /// Do not report rules that matched nothing.
    #[arg(long, default_value_t = false)]
    allow_unapplied_rules: bool,
    /// Print the changes as JSON instead of a text report.
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_logging(cli.log_format, "warn") {
        eprintln!("error: {err}");
        return ExitCode::from(2);
    }
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let settings = load_settings(cli.config.as_deref())?;
    debug!(?settings, "settings loaded");

    match cli.command {
        Command::Generate(args) => run_generate(args, &settings),
        Command::Diff(args) => run_diff(args, &settings),
        Command::Schema => {
            let schema = contract_json_schema();
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_generate(args: GenerateArgs, settings: &settings::Settings) -> Result<ExitCode, CliError> {
    let schema = load_contract(&read_json(&args.contract)?)?;
    let overrides = args.overrides.as_deref().map(read_json).transpose()?;

    let mut options = settings.synth_options();
    if let Some(seed) = args.seed {
        options.seed = Some(seed);
    }
    if let Some(locale) = args.locale.as_deref() {
        options.locale = LocaleKey::parse(locale).ok_or_else(|| {
            CliError::InvalidArgument(format!("unsupported locale '{locale}'"))
        })?;
    }
    let mode = if args.full { Mode::Full } else { Mode::Partial };
    info!(contract = %schema.name, ?mode, count = args.count, "generation started");

    let mut synth = Synthesizer::new(options);
    let mut documents = Vec::with_capacity(args.count);
    for _ in 0..args.count {
        let mut instance = synth.instantiate(&schema, mode)?;
        if let Some(overrides) = &overrides {
            instance = synth.with_values(&instance, overrides)?;
        }
        documents.push(instance.value());
    }

    let output = if documents.len() == 1 {
        documents.pop().unwrap_or(Value::Null)
    } else {
        Value::Array(documents)
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    info!(contract = %schema.name, "generation finished");
    Ok(ExitCode::SUCCESS)
}

fn run_diff(args: DiffArgs, settings: &settings::Settings) -> Result<ExitCode, CliError> {
    let expected = read_json(&args.expected)?;
    let actual = read_json(&args.actual)?;
    let rules = rule_args::parse_rules(&args.rules)?;

    let mut options = settings.diff_options();
    options.normalize = args.normalize;
    if !args.identity_keys.is_empty() {
        options.identity_keys = args.identity_keys;
    }
    if args.allow_unapplied_rules {
        options.forbid_unapplied_rules = false;
    }

    let result = compare(&expected, &actual, &rules, &options);
    info!(changes = result.len(), "comparison finished");
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", render_report(&result));
    }
    Ok(if result.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn read_json(path: &Path) -> Result<Value, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}
