use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use treelox::ast_printer::{AstPrinter, RpnPrinter};
use treelox::lox::{Lox, RunStatus};
use treelox::parser::Parser;
use treelox::scanner::scan_tokens;

const EX_USAGE: i32 = 64;
const EX_DATAERR: i32 = 65;

#[derive(ClapParser, Debug)]
#[command(
    version,
    about = "Tree-walking Lox interpreter",
    long_about = None,
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Script to run. Without one, an interactive prompt starts.
    scripts: Vec<PathBuf>,

    /// Enable logging to treelox.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the token list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parses a file as a single expression and prints its tree
    Parse {
        filename: PathBuf,

        /// Print in reverse Polish notation instead
        #[arg(long)]
        rpn: bool,
    },

    /// Runs a file as a Lox program
    Run { filename: PathBuf },
}

/// Reads a source file as UTF-8 text.
fn read_file(filename: &PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = String::new();

    let bytes = reader
        .read_to_string(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

/// Logger writing `[module:line] - message` lines.  Defaults to Debug;
/// `RUST_LOG` overrides the level.
fn log_builder() -> Builder {
    let mut builder = Builder::new();

    builder
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("treelox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env();

    builder
}

fn init_logger() -> Result<()> {
    let log_file = File::create("treelox.log").context("Failed to create treelox.log")?;

    log_builder()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    info!("Logger initialized, writing to treelox.log");
    Ok(())
}

fn tokenize(filename: &PathBuf, json: bool) -> Result<i32> {
    let source = read_file(filename)?;
    let (tokens, errors) = scan_tokens(&source);

    if json {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
    } else {
        for token in &tokens {
            println!("{}", token);
        }
    }

    for e in &errors {
        eprintln!("{}", e);
    }

    if errors.is_empty() {
        info!("Tokenization completed successfully");
        Ok(0)
    } else {
        debug!("Tokenization failed, exiting with code {}", EX_DATAERR);
        Ok(EX_DATAERR)
    }
}

fn parse(filename: &PathBuf, rpn: bool) -> Result<i32> {
    let source = read_file(filename)?;
    let (tokens, errors) = scan_tokens(&source);

    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{}", e);
        }
        return Ok(EX_DATAERR);
    }

    match Parser::new(&tokens).parse_expression() {
        Ok(expr) => {
            let printed = if rpn {
                RpnPrinter::print(&expr)
            } else {
                AstPrinter::print(&expr)
            };

            debug!("AST: {}", printed);
            println!("{}", printed);
            Ok(0)
        }

        Err(errors) => {
            for e in &errors {
                eprintln!("{}", e);
            }
            Ok(EX_DATAERR)
        }
    }
}

fn run_file(filename: &PathBuf) -> Result<i32> {
    let source = read_file(filename)?;
    let status = Lox::new().run(&source);

    info!("Program finished with {:?}", status);
    Ok(status.exit_code())
}

fn run_prompt() -> Result<i32> {
    info!("Starting interactive prompt");

    let mut lox = Lox::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("Failed to read from stdin")?;

        let status = lox.run_prompt_line(&line);
        if status != RunStatus::Ok {
            debug!("Prompt line finished with {:?}", status);
        }
    }

    println!();
    Ok(0)
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    let code = match (&args.command, args.scripts.as_slice()) {
        (Some(Commands::Tokenize { filename, json }), _) => tokenize(filename, *json)?,
        (Some(Commands::Parse { filename, rpn }), _) => parse(filename, *rpn)?,
        (Some(Commands::Run { filename }), _) => run_file(filename)?,
        (None, []) => run_prompt()?,
        (None, [script]) => run_file(script)?,
        (None, _) => {
            println!("Usage: treelox [script]");
            EX_USAGE
        }
    };

    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_overrides_default_level() {
        std::env::remove_var("RUST_LOG");
        assert_eq!(log_builder().build().filter(), log::LevelFilter::Debug);

        std::env::set_var("RUST_LOG", "warn");
        let level = log_builder().build().filter();
        std::env::remove_var("RUST_LOG");

        assert_eq!(level, log::LevelFilter::Warn);
    }
}
