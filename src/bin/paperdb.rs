//! PaperDB CLI
//!
//! Inspect and edit books from the command line. Values are UTF-8 strings.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use paperdb::{Book, Config, Registry, SyncStrategy};
use tracing_subscriber::{fmt, EnvFilter};

/// PaperDB CLI
#[derive(Parser, Debug)]
#[command(name = "paperdb")]
#[command(about = "File-backed object store: one file per key")]
#[command(version)]
struct Args {
    /// Storage root
    #[arg(short, long, default_value = "./paperdb_data")]
    root: PathBuf,

    /// Book name (default book when omitted)
    #[arg(short, long)]
    book: Option<String>,

    /// Skip fsync on writes
    #[arg(long)]
    no_sync: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// List all keys of the book
    Keys,

    /// Print the last modification time of a key (ms since epoch, -1 if absent)
    Mtime {
        /// The key to inspect
        key: String,
    },

    /// Print the book folder, or the file of a key
    Path {
        /// Optional key
        key: Option<String>,
    },

    /// Remove the whole book
    Destroy,
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,paperdb=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::debug!("PaperDB CLI v{}", paperdb::VERSION);

    let sync_strategy = if args.no_sync {
        SyncStrategy::OsBuffered
    } else {
        SyncStrategy::EveryWrite
    };
    let config = Config::builder()
        .root_dir(&args.root)
        .sync_strategy(sync_strategy)
        .build();
    let registry = Registry::open(config);

    let book = match &args.book {
        Some(name) => registry.book_named(name),
        None => registry.book(),
    };

    let result = book.and_then(|book| run(&book, args.command));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(book: &Arc<Book>, command: Commands) -> paperdb::Result<()> {
    match command {
        Commands::Get { key } => match book.read_optional::<String>(&key)? {
            Some(value) => println!("{}", value),
            None => {
                return Err(paperdb::PaperError::KeyNotFound { key });
            }
        },
        Commands::Put { key, value } => {
            book.write(&key, &value)?;
        }
        Commands::Del { key } => book.delete(&key)?,
        Commands::Keys => {
            for key in book.all_keys()? {
                println!("{}", key);
            }
        }
        Commands::Mtime { key } => println!("{}", book.last_modified(&key)?),
        Commands::Path { key } => match key {
            Some(key) => println!("{}", book.path_of(&key).display()),
            None => println!("{}", book.path().display()),
        },
        Commands::Destroy => book.destroy()?,
    }
    Ok(())
}
