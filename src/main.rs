use std::error::Error;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use roost::model::{Config, WorkspaceId};
use roost::ops::transfer::{self, ImportPayload};
use roost::store::Store;

#[derive(Parser)]
#[command(name = "roost", about = "A tree-structured todo manager", version)]
struct Cli {
    /// Database file (overrides the config file and the platform default)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a workspace subtree as JSON to a file (stdout when omitted)
    Export {
        /// Output file
        file: Option<PathBuf>,
        /// Workspace to export; defaults to the root
        #[arg(long)]
        workspace: Option<i64>,
    },
    /// Read JSON produced by export (or a bare todo array) into a workspace
    Import {
        /// Input file
        file: PathBuf,
        /// Workspace to import into; defaults to the root
        #[arg(long)]
        workspace: Option<i64>,
        /// Assign new ids instead of keeping the ones in the file
        #[arg(long)]
        fresh_ids: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let db = cli.db.clone();

    let result = match cli.command {
        // No subcommand launches the TUI
        None => roost::tui::run(db.as_deref()),
        Some(Commands::Export { file, workspace }) => cmd_export(db, file, workspace),
        Some(Commands::Import {
            file,
            workspace,
            fresh_ids,
        }) => cmd_import(db, file, workspace, fresh_ids),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn open_store(db: Option<PathBuf>) -> Result<Store, Box<dyn Error>> {
    let config = Config::load()?;
    Ok(Store::open(&config.resolve_db_path(db.as_deref()))?)
}

fn resolve_workspace(store: &Store, id: Option<i64>) -> Result<WorkspaceId, Box<dyn Error>> {
    match id {
        Some(raw) => {
            let id = WorkspaceId(raw);
            store
                .get_workspace(id)?
                .ok_or_else(|| format!("no workspace with id {}", raw))?;
            Ok(id)
        }
        None => Ok(store.root_workspace()?.id),
    }
}

fn cmd_export(
    db: Option<PathBuf>,
    file: Option<PathBuf>,
    workspace: Option<i64>,
) -> Result<(), Box<dyn Error>> {
    let store = open_store(db)?;
    let target = resolve_workspace(&store, workspace)?;
    let payload = transfer::export_workspace(&store, target)?;

    match file {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(&path)?);
            serde_json::to_writer_pretty(&mut writer, &payload)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, &payload)?;
            writer.write_all(b"\n")?;
        }
    }
    Ok(())
}

fn cmd_import(
    db: Option<PathBuf>,
    file: PathBuf,
    workspace: Option<i64>,
    fresh_ids: bool,
) -> Result<(), Box<dyn Error>> {
    let mut store = open_store(db)?;
    let target = resolve_workspace(&store, workspace)?;

    let reader = BufReader::new(File::open(&file)?);
    let payload: ImportPayload = serde_json::from_reader(reader)?;
    transfer::import_into_workspace(&mut store, target, &payload, !fresh_ids)?;
    Ok(())
}
