//! Imagestack CLI
//!
//! Usage:
//!   imagestack [OPTIONS] [TEMPLATE]
//!
//! Options:
//!   -c, --context <FILE>  Context document (JSON, or TOML by extension)
//!   --tree                Print the analysed syntax tree instead of resolving
//!   --registry            List the names templates may construct
//!   --pretty              Pretty-print the resolved graph
//!   -h, --help            Print help

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use imagestack::{analyse, context, Error, Registry, Template, Value};

#[derive(Parser)]
#[command(name = "imagestack")]
#[command(about = "Resolve layer-stack templates against a context")]
struct Cli {
    /// Template file (reads from stdin if not provided)
    template: Option<PathBuf>,

    /// Context document; JSON, or TOML for `.toml` files
    #[arg(short, long)]
    context: Option<PathBuf>,

    /// Print the analysed syntax tree and exit
    #[arg(long)]
    tree: bool,

    /// List constructible names and exit
    #[arg(long)]
    registry: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if cli.registry {
        for name in Registry::global().names() {
            println!("{}", name);
        }
        return;
    }

    // Read template
    let (text, filename) = match &cli.template {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => (content, path.display().to_string()),
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => (buffer, "<stdin>".to_string()),
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    if cli.tree {
        match analyse(&text) {
            Ok(tree) => print!("{}", tree),
            Err(errors) => exit_with(Error::Parse(errors), &text, &filename),
        }
        return;
    }

    // Load context
    let context = match &cli.context {
        Some(path) => match context::from_file(path) {
            Ok(value) => value,
            Err(e) => {
                eprintln!("Error loading context '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Value::None,
    };

    let layer = match Template::parse(&text) {
        Ok(template) => match template.resolve(&context) {
            Ok(layer) => layer,
            Err(e) => exit_with(e.into(), &text, &filename),
        },
        Err(e) => exit_with(e, &text, &filename),
    };

    let output = if cli.pretty {
        serde_json::to_string_pretty(&layer)
    } else {
        serde_json::to_string(&layer)
    };
    match output {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error writing output: {}", e);
            std::process::exit(1);
        }
    }
}

fn exit_with(error: Error, text: &str, filename: &str) -> ! {
    match &error {
        Error::Parse(errors) => {
            for e in errors {
                eprint!("{}", e.format(text, filename));
            }
        }
        other => eprintln!("Error: {}", other),
    }
    std::process::exit(1);
}
