//! Jack Compiler CLI
//!
//! Command-line interface for compiling `.jack` sources (or a directory of
//! them) to Hack VM text.

use clap::{CommandFactory, Parser as ClapParser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::process;

#[derive(ClapParser)]
#[command(name = "jackc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Jack compiler - compile .jack sources to Hack VM text", long_about = None)]
struct Cli {
    /// A .jack file, or a directory containing .jack files
    path: Option<PathBuf>,

    /// Dump the token stream for each compiled file to stderr
    #[arg(long)]
    keep_tokens: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completion scripts
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => run_completions(shell),
        None => match cli.path {
            Some(path) => run_compile(&path, cli.keep_tokens),
            None => {
                eprintln!("Error: a .jack file or directory path is required");
                process::exit(1);
            }
        },
    }
}

fn run_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "jackc", &mut io::stdout());
}

fn run_compile(path: &PathBuf, keep_tokens: bool) {
    let units = match jackc::discover(path) {
        Ok(units) => units,
        Err(e) => {
            eprintln!("Error: failed to read {}: {}", path.display(), e);
            process::exit(1);
        }
    };

    if units.is_empty() {
        eprintln!("Error: no .jack files found in {}", path.display());
        process::exit(1);
    }

    let mut had_failure = false;
    for unit in &units {
        if keep_tokens {
            dump_tokens(&unit.source_path);
        }
        match jackc::compile_unit(unit) {
            Ok(()) => {
                println!(
                    "Compiled {} -> {}",
                    unit.source_path.display(),
                    unit.output_path.display()
                );
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                had_failure = true;
            }
        }
    }

    if had_failure {
        process::exit(1);
    }
}

fn dump_tokens(source_path: &PathBuf) {
    let Ok(source) = std::fs::read_to_string(source_path) else {
        return;
    };
    match jackc::tokenize(&source, source_path) {
        Ok(tokens) => {
            for tok in tokens {
                eprintln!("{:?} {:?}", tok.kind, tok.lexeme);
            }
        }
        Err(e) => eprintln!("Error: {}", e),
    }
}
