mod view;

use std::{fs, process::ExitCode};

use clap::{Parser, Subcommand};
use cvdialog::{
    DialogResource, Error, Locale, ParseOptions, Schema, parse_with_options, source, tokenize,
    verify, write_dialog,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::view::print_view;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
}

/// Supported subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the tokens of a dialog or string file, one per line.
    Tokens {
        /// The input file to tokenize
        #[arg(short, long)]
        input: String,

        /// Encoding of the input file
        #[arg(short, long, default_value = "windows-1252")]
        encoding: String,
    },

    /// Summarize a dialog file.
    View {
        /// The dialog file to view
        #[arg(short, long)]
        input: String,

        /// Locale the file belongs to (any, us, de, jp)
        #[arg(short, long, default_value = "any")]
        locale: Locale,

        /// Print the parsed resource as JSON instead
        #[arg(long)]
        json: bool,
    },

    /// Check a dialog file against a property schema.
    Verify {
        /// The dialog file to check
        #[arg(short, long)]
        input: String,

        /// JSON schema describing the known properties
        #[arg(short, long)]
        schema: String,
    },

    /// Parse a dialog file and write it back out.
    Export {
        /// The dialog file to read
        #[arg(short, long)]
        input: String,

        /// Where to write the result; standard output when omitted
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args.commands) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<ExitCode, Error> {
    match command {
        Commands::Tokens { input, encoding } => {
            let text = source::read_file(&input, &encoding)?;
            for token in tokenize(&text)? {
                println!("{}", token);
            }
        }
        Commands::View {
            input,
            locale,
            json,
        } => match read_dialog(&input, locale, ParseOptions::default())? {
            Some(resource) if json => {
                println!("{}", serde_json::to_string_pretty(&resource)?);
            }
            Some(resource) => print_view(&resource),
            None => println!("{} only includes another dialog file", input),
        },
        Commands::Verify { input, schema } => {
            let schema = Schema::from_reader(fs::File::open(&schema)?)?;
            let options = ParseOptions::new().with_flag_resolver(&schema);
            let Some(resource) = read_dialog(&input, Locale::Any, options)? else {
                println!("{} only includes another dialog file", input);
                return Ok(ExitCode::SUCCESS);
            };

            let log = verify(&resource, &schema);
            for line in &log {
                println!("{}", line);
            }
            if cvdialog::verify::has_errors(&log) {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Export { input, output } => {
            let resource = read_dialog(&input, Locale::Any, ParseOptions::default())?
                .ok_or_else(|| {
                    Error::Unsupported(format!("{} only includes another dialog file", input))
                })?;
            let text = write_dialog(&resource)?;
            match output {
                Some(path) => {
                    fs::write(&path, text)?;
                    debug!("wrote {}", path);
                }
                None => print!("{}", text),
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn read_dialog(
    path: &str,
    locale: Locale,
    options: ParseOptions<'_>,
) -> Result<Option<DialogResource>, Error> {
    let text = source::read_file(path, "windows-1252")?;
    parse_with_options(&tokenize(&text)?, locale, options)
}
