mod manifest;
mod report;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use line_argparse::help;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tracing_subscriber::{EnvFilter, fmt};

use crate::manifest::{DEFAULT_MANIFEST_NAME, load_manifest, write_default_manifest};
use crate::report::{CheckReport, ParseReport};

#[derive(Parser)]
#[command(name = "line")]
#[command(version, about = "Declarative command-line definitions", long_about = None)]
#[command(disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a sample line.json
    Init(InitArgs),

    /// Compile a manifest and report definition errors
    Check(CheckArgs),

    /// Dispatch tokens against a manifest without running anything
    Parse(ParseArgs),

    /// Print the help menu of a command
    Help(HelpArgs),
}

#[derive(Parser)]
struct InitArgs {
    /// Project directory (default: current directory)
    #[arg(value_name = "DIR")]
    dir: Option<PathBuf>,

    /// CLI name (default: directory name)
    #[arg(short, long)]
    name: Option<String>,

    /// Overwrite an existing manifest
    #[arg(long)]
    force: bool,
}

#[derive(Parser)]
struct CheckArgs {
    /// Path to line.json manifest
    #[arg(short, long, value_name = "FILE")]
    manifest: Option<PathBuf>,

    /// Only output JSON (no human-readable output)
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct ParseArgs {
    /// Path to line.json manifest
    #[arg(short, long, value_name = "FILE")]
    manifest: Option<PathBuf>,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,

    /// Tokens to dispatch, after `--`
    #[arg(last = true, allow_hyphen_values = true, value_name = "TOKENS")]
    tokens: Vec<String>,
}

#[derive(Parser)]
struct HelpArgs {
    /// Path to line.json manifest
    #[arg(short, long, value_name = "FILE")]
    manifest: Option<PathBuf>,

    /// Subcommand path below the root command
    #[arg(value_name = "PATH")]
    path: Vec<String>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Init(args) => init(args),
        Commands::Check(args) => check_command(args),
        Commands::Parse(args) => {
            let code = parse_command(args)?;
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Commands::Help(args) => help_command(args),
    }
}

fn init(args: InitArgs) -> Result<()> {
    let dir = args.dir.unwrap_or_else(|| PathBuf::from("."));

    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create directory: {}", dir.display()))?;

    let manifest_path = write_default_manifest(&dir, args.name.as_deref(), args.force)?;

    eprintln!("Created: {}", manifest_path.display());
    eprintln!("\nNext steps:");
    eprintln!("  1. Edit {DEFAULT_MANIFEST_NAME} to describe your commands");
    eprintln!("  2. Run: line check");
    eprintln!("  3. Try: line parse -- --help");

    Ok(())
}

fn check_command(args: CheckArgs) -> Result<()> {
    tracing::debug!("executing check command");

    let loaded = load_manifest(args.manifest.as_deref())?;
    let source = loaded.path.display().to_string();

    let report = match loaded.manifest.to_cli() {
        Ok(cli) => CheckReport::compiled(source, &cli),
        Err(err) => CheckReport::failed(source, err.to_string()),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        if !report.ok {
            std::process::exit(1);
        }
        return Ok(());
    }

    if let Some(error) = &report.error {
        bail!("{error}");
    }

    eprintln!("Manifest: {}", report.manifest);
    eprintln!("Commands: {}", report.commands.len());
    for command in &report.commands {
        let marker = if command.handler { "" } else { " (group)" };
        if command.usage.is_empty() {
            eprintln!("  {}{marker}", command.path);
        } else {
            eprintln!("  {} {}{marker}", command.path, command.usage);
        }
    }
    eprintln!("OK: all definitions compile");

    Ok(())
}

fn parse_command(args: ParseArgs) -> Result<i32> {
    tracing::debug!(tokens = args.tokens.len(), "executing parse command");

    let loaded = load_manifest(args.manifest.as_deref())?;
    let cli = loaded
        .manifest
        .to_cli()
        .with_context(|| format!("invalid manifest: {}", loaded.path.display()))?;

    let dispatch = cli.decide(&args.tokens);
    let code = dispatch.exit_code();
    let report = ParseReport::from_dispatch(&cli, &dispatch);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if matches!(report, ParseReport::Error { .. }) {
        eprint!("{}", report.render());
    } else {
        print!("{}", report.render());
    }
    std::io::stdout().flush().context("failed to flush stdout")?;

    Ok(code)
}

fn help_command(args: HelpArgs) -> Result<()> {
    let loaded = load_manifest(args.manifest.as_deref())?;
    let cli = loaded
        .manifest
        .to_cli()
        .with_context(|| format!("invalid manifest: {}", loaded.path.display()))?;

    let Some(command) = cli.find(&args.path) else {
        bail!(
            "no command '{}' in {}",
            args.path.join(" "),
            display_name(&loaded.path)
        );
    };

    let mut path = vec![cli.command_name().to_string()];
    path.extend(args.path.iter().cloned());
    print!("{}", help::help(&cli, command, &path));

    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(DEFAULT_MANIFEST_NAME)
        .to_string()
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();
}
