//! CLI tool to tokenize, check, and translate polyscript source files.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use polyscript_rs::{Target, analyze, format_diagnostics, format_tokens, tokenize};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "polyscript")]
#[command(about = "Analyze a small scripting language and translate it to PHP, C, Ruby or Go")]
#[command(version)]
struct Args {
    /// Log every analysis phase and applied rewrite rule
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the token table of each file
    Tokens {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },
    /// Report lexical, syntactic and semantic errors of each file
    Check {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },
    /// Rewrite a file into another language
    Translate {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Target language: php, c, ruby or go
        #[arg(short, long, default_value = "php")]
        to: Target,

        /// Write the result here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Tokens { files } => for_each_file(&files, |path, content| {
            let lexed = tokenize(content);
            println!("{}:", path.display());
            print!("{}", format_tokens(&lexed.sequence()));
            lexed.is_clean()
        }),
        Command::Check { files } => for_each_file(&files, |path, content| {
            let analysis = analyze(content);
            println!("{}:", path.display());
            print!("{}", format_diagnostics(&analysis.diagnostics));
            analysis.is_clean()
        }),
        Command::Translate { file, to, output } => translate_file(&file, to, output.as_deref()),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Run `action` on every readable file; fail if any file is unreadable
/// or `action` reports a problem.
fn for_each_file(files: &[PathBuf], mut action: impl FnMut(&Path, &str) -> bool) -> ExitCode {
    let mut had_error = false;
    for path in files {
        match fs::read_to_string(path) {
            Ok(content) => had_error |= !action(path, &content),
            Err(e) => {
                eprintln!("{}: {e}", path.display());
                had_error = true;
            }
        }
    }
    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn translate_file(path: &Path, target: Target, output: Option<&Path>) -> ExitCode {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {e}", path.display());
            return ExitCode::from(2);
        }
    };

    let translated = match polyscript_rs::translate(&content, target) {
        Ok(text) => text,
        Err(errors) => {
            for error in &errors.0 {
                eprintln!("{}: {error}", path.display());
            }
            return ExitCode::FAILURE;
        }
    };

    match output {
        Some(out) => {
            if let Err(e) = fs::write(out, format!("{translated}\n")) {
                eprintln!("{}: {e}", out.display());
                return ExitCode::from(2);
            }
            eprintln!("{}: translated to {target} in {}", path.display(), out.display());
        }
        None => println!("{translated}"),
    }
    ExitCode::SUCCESS
}
