//! Command-line access to XML data files.
//!
//! Opens one document and runs a single query or conversion on it.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tixi::{DocumentHandle, OpenMode, Tixi, TixiError};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// tixi -- query and convert XML data files.
#[derive(Parser, Debug)]
#[command(name = "tixi", version, about, long_about = None)]
struct Cli {
    /// XML file to open.
    file: String,

    /// Splice the files referenced by `externaldata` nodes into the tree.
    #[arg(long)]
    recursive: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the whole document.
    Export {
        /// Indent the output.
        #[arg(long)]
        pretty: bool,
    },
    /// Print the text of the element an XPath selects.
    Text { xpath: String },
    /// Print how many nodes an XPath selects.
    Count { xpath: String },
    /// Print the canonical path of every node an XPath selects.
    Paths { xpath: String },
    /// Print an attribute of the element an XPath selects.
    Attr { xpath: String, name: String },
    /// Check that uIDs are unique and every link resolves.
    UidCheck,
    /// Open recursively and save the complete document to a new file.
    Resolve { out: String },
}

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

const EXIT_SUCCESS: u8 = 0;
const EXIT_OPEN_ERROR: u8 = 1;
const EXIT_QUERY_ERROR: u8 = 2;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("TIXI_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut tixi = Tixi::new();

    let mode = if cli.recursive || matches!(cli.command, Command::Resolve { .. }) {
        OpenMode::Recursive
    } else {
        OpenMode::Plain
    };
    let handle = match tixi.open_document_recursive(&cli.file, mode) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("{}: {e}", cli.file);
            return ExitCode::from(EXIT_OPEN_ERROR);
        }
    };

    let exit = match run(&mut tixi, handle, &cli.command) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("{}: {e} ({})", cli.file, e.code());
            EXIT_QUERY_ERROR
        }
    };
    tixi.cleanup();
    ExitCode::from(exit)
}

fn run(tixi: &mut Tixi, handle: DocumentHandle, command: &Command) -> Result<(), TixiError> {
    match command {
        Command::Export { pretty } => {
            tixi.use_pretty_print(handle, i32::from(*pretty))?;
            print!("{}", tixi.export_document_as_string(handle)?);
        }
        Command::Text { xpath } => println!("{}", tixi.get_text_element(handle, xpath)?),
        Command::Count { xpath } => {
            println!("{}", tixi.xpath_evaluate_node_number(handle, xpath)?);
        }
        Command::Paths { xpath } => {
            let count = tixi.xpath_evaluate_node_number(handle, xpath)?;
            for index in 1..=i32::try_from(count).unwrap_or(i32::MAX) {
                println!("{}", tixi.xpath_expression_get_xpath(handle, xpath, index)?);
            }
        }
        Command::Attr { xpath, name } => {
            println!("{}", tixi.get_text_attribute(handle, xpath, name)?);
        }
        Command::UidCheck => {
            tixi.uid_check_duplicates(handle)?;
            tixi.uid_check_links(handle)?;
            println!("ok");
        }
        Command::Resolve { out } => tixi.save_complete_document(handle, out)?,
    }
    Ok(())
}
