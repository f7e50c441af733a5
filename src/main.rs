use anyhow::{Context, Result};
use clap::{Parser as ClapParser, Subcommand, ValueEnum};
use colored::Colorize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use uast_query::{
    codec, load_from_path, Language, Node, ParseMode, Parser, PathQuery, TreeSitterParser,
};

/// Environment variable holding a `tracing` filter, e.g. `uast_query=debug`.
const LOG_ENV: &str = "UAST_QUERY_LOG";

#[derive(ClapParser)]
#[command(name = "uast-query")]
#[command(about = "Extract universal syntax trees from source code and query them", long_about = None)]
#[command(version)]
struct Cli {
    /// Backend configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a source file into a UAST
    Parse {
        /// Source file to parse
        file: PathBuf,

        /// Language of the file (inferred from extension or shebang if omitted)
        #[arg(short, long)]
        language: Option<String>,

        /// Tree shape: annotated, semantic or native
        #[arg(short, long)]
        mode: Option<ParseMode>,

        /// Path query selecting subtrees
        #[arg(short, long)]
        query: Option<String>,

        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a path query over previously encoded trees
    Filter {
        /// Encoded tree files
        #[arg(required = true)]
        encoded: Vec<PathBuf>,

        /// Path query selecting subtrees
        #[arg(short, long)]
        query: String,

        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List supported languages
    Languages,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Binary,
}

/// What a command produced: one whole tree, or a list of matches.
enum Output<'a> {
    Tree(&'a Node),
    Matches(Vec<&'a Node>),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let parser = build_parser(cli.config.as_deref())?;

    match cli.command {
        Commands::Parse {
            file,
            language,
            mode,
            query,
            format,
            output,
        } => cmd_parse(
            &parser,
            &file,
            language.as_deref(),
            mode,
            query.as_deref(),
            format,
            output.as_deref(),
        ),

        Commands::Filter {
            encoded,
            query,
            format,
            output,
        } => cmd_filter(&encoded, &query, format, output.as_deref()),

        Commands::Languages => cmd_languages(&parser),
    }
}

/// `UAST_QUERY_LOG` wins over `-v`; logs go to stderr so stdout stays clean.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn build_parser(config: Option<&Path>) -> Result<TreeSitterParser> {
    let Some(path) = config else {
        return Ok(TreeSitterParser::new());
    };

    let config = load_from_path(path)?;
    debug!(path = %path.display(), "loaded backend config");
    TreeSitterParser::from_config(&config)
        .with_context(|| format!("invalid backend config {}", path.display()))
}

fn cmd_parse(
    parser: &TreeSitterParser,
    file: &Path,
    language: Option<&str>,
    mode: Option<ParseMode>,
    query: Option<&str>,
    format: Format,
    output: Option<&Path>,
) -> Result<()> {
    let source =
        fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;

    // Fall back to the extension before the backend tries the shebang.
    let inferred = Language::from_path(file)
        .filter(|_| Language::from_shebang(&source).is_none())
        .map(|lang| lang.name());
    let language = language.or(inferred);

    let tree = parser.parse(&source, language, mode)?;

    match query {
        Some(query) => {
            let query = PathQuery::compile(query)?;
            let matches = query.evaluate(&tree);
            debug!(matches = matches.len(), "evaluated query");
            write_output(Output::Matches(matches), format, output)
        }
        None => write_output(Output::Tree(&tree), format, output),
    }
}

fn cmd_filter(
    encoded: &[PathBuf],
    query: &str,
    format: Format,
    output: Option<&Path>,
) -> Result<()> {
    let query = PathQuery::compile(query)?;

    let mut trees = Vec::with_capacity(encoded.len());
    for path in encoded {
        let bytes =
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let tree = codec::decode(&bytes)
            .with_context(|| format!("{} is not an encoded tree", path.display()))?;
        trees.push(tree);
    }

    let matches: Vec<&Node> = trees.iter().flat_map(|tree| query.evaluate(tree)).collect();
    debug!(trees = trees.len(), matches = matches.len(), "filtered trees");
    write_output(Output::Matches(matches), format, output)
}

fn cmd_languages(parser: &TreeSitterParser) -> Result<()> {
    let enabled: Vec<Language> = parser.languages().collect();

    println!("{}", "Supported languages:".bold());
    for lang in Language::ALL {
        let aliases = lang.aliases().join(", ");
        let line = if aliases.is_empty() {
            format!("  {}", lang.name())
        } else {
            format!("  {} ({})", lang.name(), aliases)
        };

        if enabled.contains(&lang) {
            println!("{}", line.green());
        } else {
            println!("{} {}", line.dimmed(), "[disabled]".dimmed());
        }
    }
    println!();
    println!("Default mode: {}", parser.default_mode());

    Ok(())
}

fn write_output(result: Output<'_>, format: Format, output: Option<&Path>) -> Result<()> {
    match format {
        Format::Json => {
            let json = match &result {
                Output::Tree(tree) => serde_json::to_string_pretty(tree),
                Output::Matches(matches) => serde_json::to_string_pretty(matches),
            }
            .context("cannot render JSON output, use --format binary for deep trees")?;
            match output {
                Some(path) => write_file(path, format!("{json}\n").as_bytes()),
                None => {
                    println!("{json}");
                    Ok(())
                }
            }
        }

        Format::Binary => match (result, output) {
            (Output::Tree(tree), Some(path)) => write_file(path, &codec::encode(tree)),
            (Output::Tree(tree), None) => write_stdout(&codec::encode(tree)),
            (Output::Matches(matches), Some(path)) => {
                for (i, node) in matches.iter().enumerate() {
                    write_file(&numbered(path, i), &codec::encode(node))?;
                }
                eprintln!(
                    "{}",
                    format!("wrote {} encoded trees", matches.len()).dimmed()
                );
                Ok(())
            }
            (Output::Matches(matches), None) => match matches.as_slice() {
                [] => Ok(()),
                [node] => write_stdout(&codec::encode(node)),
                _ => anyhow::bail!(
                    "{} matches cannot be written to stdout as binary; use --output",
                    matches.len()
                ),
            },
        },
    }
}

/// `out.bin` becomes `out.bin.0`, `out.bin.1`, ...
fn numbered(path: &Path, index: usize) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}

fn write_stdout(bytes: &[u8]) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(bytes)?;
    stdout.flush()?;
    Ok(())
}
