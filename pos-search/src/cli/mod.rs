use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use pos_search::Result;
use pos_search::config::Config;
use pos_search::domain::{Collection, PartyKind, RecordId, SearchMode};
use pos_search::storage::LocalStore;

mod import;
mod party;
mod remove;
mod search;
mod status;

#[derive(Parser)]
#[command(name = "pos-search")]
#[command(about = "Spreadsheet import and instant search for a point-of-sale catalogue")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output as JSON")]
    pub json: bool,

    #[arg(long, global = true, help = "Store file (overrides config)")]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Import products from a spreadsheet (xlsx, xls, ods, csv)")]
    Import {
        #[arg(help = "Spreadsheet file")]
        file: PathBuf,
    },

    #[command(about = "Search products or parties")]
    Search {
        #[arg(default_value = "", help = "Search term (blank lists the first records)")]
        term: String,

        #[arg(long, default_value = "products", help = "Collection: products, parties")]
        collection: Collection,

        #[arg(long, default_value = "fast", help = "Search mode: fast, accurate")]
        mode: SearchMode,
    },

    #[command(about = "Add a customer or supplier")]
    AddParty {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        gstin: String,

        #[arg(long, default_value = "")]
        phone: String,

        #[arg(long, default_value = "")]
        email: String,

        #[arg(long, default_value = "")]
        address: String,

        #[arg(long, default_value = "wholesale", help = "Party type: wholesale, retail")]
        kind: PartyKind,
    },

    #[command(about = "Delete a record by id")]
    Remove {
        #[arg(help = "Record id")]
        id: u64,

        #[arg(long, default_value = "products", help = "Collection: products, parties")]
        collection: Collection,
    },

    #[command(about = "Show store location and record counts")]
    Status,
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let store = open_store(&config, cli.store)?;

    match cli.command {
        Commands::Import { file } => import::run(store, &config, &file, cli.json).await,
        Commands::Search {
            term,
            collection,
            mode,
        } => search::run(store, &config, term, collection, mode, cli.json).await,
        Commands::AddParty {
            name,
            gstin,
            phone,
            email,
            address,
            kind,
        } => {
            let party = pos_search::domain::Party {
                name,
                gstin,
                phone,
                email,
                address,
                kind,
            };
            party::run(store, party, cli.json).await
        }
        Commands::Remove { id, collection } => {
            remove::run(store, collection, RecordId::new(id), cli.json).await
        }
        Commands::Status => status::run(store, cli.json).await,
    }
}

fn open_store(config: &Config, path_override: Option<PathBuf>) -> Result<Arc<LocalStore>> {
    let path = path_override.unwrap_or_else(|| config.store_path());
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(Arc::new(LocalStore::open(path)?))
}
