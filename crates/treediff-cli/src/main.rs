//! Command-line interface for `treediff-core`.
//!
//! Compares two JSON or YAML documents, either as keyed trees or as generic
//! documents, and prints the diff tree as JSON (or YAML). The exit status is
//! 0 when the inputs are equal, 1 when they differ and 2 on error.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use treediff_core::{
    compare_keyed_trees, compare_values, try_compare_keyed_trees, Correlation, Diff, DiffOptions,
    Node,
};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
enum Mode {
    /// Correlate sibling elements by identity and recurse through children.
    Keyed,
    /// Compare arbitrary documents structurally.
    #[default]
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "treediff",
    version,
    about = "Structural diff for keyed trees and JSON or YAML documents.",
    after_help = "Examples:\n  treediff old.json new.json\n  cat new.json | treediff old.json\n  \
                  treediff --mode keyed --key uid --label title old.json new.json"
)]
struct Cli {
    /// Comparison mode.
    #[arg(long, value_enum, default_value_t = Mode::Json)]
    mode: Mode,

    /// Identity field used to correlate siblings in keyed mode.
    #[arg(long, value_name = "FIELD")]
    key: Option<String>,

    /// Correlate siblings by index instead of by identity.
    #[arg(long, conflicts_with = "key")]
    position: bool,

    /// Field holding nested keyed sequences.
    #[arg(long, value_name = "FIELD")]
    children: Option<String>,

    /// Do not recurse into a children field.
    #[arg(long, conflicts_with = "children")]
    no_children: bool,

    /// Comma-separated fields to ignore at every depth.
    #[arg(long, value_name = "FIELDS", value_delimiter = ',')]
    ignore: Vec<String>,

    /// Field used to build business paths.
    #[arg(long, value_name = "FIELD")]
    label: Option<String>,

    /// JSON or YAML file with diff options; flags override its values.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Read inputs and write output as YAML.
    #[arg(long)]
    yaml: bool,

    /// Reject duplicate identities instead of letting the later element win.
    #[arg(long)]
    strict: bool,

    /// Print per-kind counts instead of the diff tree.
    #[arg(long)]
    summary: bool,

    /// Print JSON on a single line.
    #[arg(long)]
    compact: bool,

    /// Write output to FILE instead of STDOUT.
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Emit logs as JSON lines on STDERR.
    #[arg(long)]
    log_json: bool,

    /// Old document.
    old: PathBuf,

    /// New document; read from STDIN when omitted.
    new: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_json);
    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            let _ = writeln!(io::stderr(), "treediff: {err:#}");
            std::process::exit(2);
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(cli: &Cli) -> Result<i32> {
    if cli.strict && cli.mode != Mode::Keyed {
        bail!("--strict only applies to --mode keyed");
    }

    let options = build_options(cli)?;
    let old_text = read_input(Some(&cli.old))?;
    let new_text = read_input(cli.new.as_deref())?;
    let old = parse_node(&old_text, cli.yaml).context("failed to parse old document")?;
    let new = parse_node(&new_text, cli.yaml).context("failed to parse new document")?;

    let diff = match cli.mode {
        Mode::Keyed if cli.strict => try_compare_keyed_trees(&old, &new, &options)?,
        Mode::Keyed => compare_keyed_trees(&old, &new, &options),
        Mode::Json => compare_values(&old, &new, &options),
    };
    debug!(mode = ?cli.mode, nodes = diff.walk().count(), "diff computed");

    let rendered = render(&diff, cli)?;
    match &cli.output {
        Some(path) => fs::write(path, rendered.as_bytes())
            .with_context(|| format!("failed to write output to {}", path.display()))?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(if diff.is_empty() { 0 } else { 1 })
}

fn build_options(cli: &Cli) -> Result<DiffOptions> {
    let mut options = match &cli.config {
        Some(path) => load_config(path)?,
        None => DiffOptions::default(),
    };

    let correlation = if cli.position {
        Correlation::ByPosition
    } else if let Some(key) = &cli.key {
        Correlation::ByIdentity(key.clone())
    } else {
        options.correlation().clone()
    };
    let children_field = if cli.no_children {
        None
    } else {
        cli.children.clone().or_else(|| options.children_field().map(str::to_string))
    };
    options = options.with_structure(correlation, children_field)?;
    if !cli.ignore.is_empty() {
        options = options.with_ignored_fields(cli.ignore.iter().map(|field| field.trim()))?;
    }
    if let Some(label) = &cli.label {
        options = options.with_label_field(label.as_str())?;
    }

    Ok(options)
}

fn load_config(path: &Path) -> Result<DiffOptions> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let is_yaml = path.extension().is_some_and(|ext| ext == "yaml" || ext == "yml");
    let options: DiffOptions = if is_yaml {
        serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))?
    } else {
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))?
    };
    options.validate().with_context(|| format!("invalid config {}", path.display()))?;
    debug!(config = %path.display(), correlation = %options.correlation(), "loaded config");
    Ok(options)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
        }
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).context("failed to read STDIN")?;
            Ok(buffer)
        }
    }
}

fn parse_node(input: &str, yaml: bool) -> Result<Node> {
    let node = if yaml { Node::from_yaml_str(input)? } else { Node::from_json_str(input)? };
    Ok(node)
}

fn render(diff: &Diff, cli: &Cli) -> Result<String> {
    if cli.summary {
        let summary = diff.summary();
        return Ok(format!("{summary}\n"));
    }
    let mut rendered = if cli.yaml {
        serde_yaml::to_string(diff).context("failed to serialize diff as YAML")?
    } else if cli.compact {
        serde_json::to_string(diff).context("failed to serialize diff")?
    } else {
        serde_json::to_string_pretty(diff).context("failed to serialize diff")?
    };
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }
    Ok(rendered)
}
