// src/main.rs
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ndc_halal::dailymed::DailyMedClient;
use ndc_halal::extractors::{DuplicateSectionPolicy, IngredientExtractor};
use ndc_halal::storage::{catalog, HalalStatus, StorageManager, TagStore};
use ndc_halal::utils::{self, config::AppConfig, AppError};

const DISCLAIMER: &str = "Disclaimer: informational only. Not medical or religious advice.";

/// NDC halal lookup and label ingredient viewer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the catalog, halal tags and exports
    #[arg(short, long, default_value = "./data", global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search the local catalog by NDC, brand or generic name
    Search {
        query: String,

        /// Write the results to this CSV file
        #[arg(short, long)]
        export: Option<PathBuf>,
    },

    /// Import or update products from a CSV file (upsert on ndc)
    Import { csv: PathBuf },

    /// Fetch a DailyMed label and list its active and inactive ingredients
    Ingredients {
        /// SPL set id of the label
        #[arg(short, long, conflicts_with = "ndc", required_unless_present = "ndc")]
        set_id: Option<String>,

        /// NDC to resolve to its newest label
        #[arg(short, long)]
        ndc: Option<String>,

        /// Save ingredients.csv and ingredients_meta.json under the data directory
        #[arg(short, long)]
        export: bool,

        /// Fail when a label has two sections with the same ingredient heading
        #[arg(long)]
        strict: bool,

        /// Debug mode - save the raw label XML
        #[arg(long)]
        debug: bool,
    },

    /// Read or write the halal tag of a label
    Tag {
        #[command(subcommand)]
        action: TagAction,
    },
}

#[derive(Subcommand, Debug)]
enum TagAction {
    /// Show the tag stored for a label
    Get { id: String },

    /// Store a tag for a label
    Set {
        id: String,

        /// Halal, Non-Halal or Unknown
        #[arg(short, long)]
        status: HalalStatus,

        #[arg(short, long, default_value = "")]
        notes: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::info!("Starting with args: {:?}", args);

    // 3. Resolve configuration and storage
    let config = AppConfig::from_env(&args.data_dir)?;
    let storage = StorageManager::new(&config.data_dir)?;

    let result = match args.command {
        Command::Search { query, export } => run_search(&storage, &query, export),
        Command::Import { csv } => run_import(&storage, csv),
        Command::Ingredients { set_id, ndc, export, strict, debug } => {
            let policy = if strict { DuplicateSectionPolicy::Reject } else { DuplicateSectionPolicy::LastWins };
            run_ingredients(&config, &storage, set_id, ndc, export, policy, debug).await
        }
        Command::Tag { action } => run_tag(&storage, action),
    };

    if let Err(e) = &result {
        tracing::error!("{}", e);
    }
    result
}

fn run_search(storage: &StorageManager, query: &str, export: Option<PathBuf>) -> Result<(), AppError> {
    if query.trim().is_empty() {
        println!("Enter a search term to begin.");
        return Ok(());
    }

    let catalog = storage.open_catalog()?;
    let rows = catalog.search(query);
    println!("Found {} result(s)", rows.len());

    for row in &rows {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            row.ndc,
            row.proprietary_name.as_deref().unwrap_or("-"),
            row.nonproprietary_name.as_deref().unwrap_or("-"),
            row.labeler_name.as_deref().unwrap_or("-"),
            row.halal_status.unwrap_or_default(),
        );
    }

    if let Some(path) = export {
        let file = std::fs::File::create(&path)?;
        catalog::write_csv(file, &rows)?;
        tracing::info!("Exported {} rows to {}", rows.len(), path.display());
    }

    println!("{}", DISCLAIMER);
    Ok(())
}

fn run_import(storage: &StorageManager, csv: PathBuf) -> Result<(), AppError> {
    tracing::info!("Importing products from {}", csv.display());
    let file = std::fs::File::open(&csv)?;

    let mut catalog = storage.open_catalog()?;
    let summary = catalog.import_csv(file)?;
    catalog.save()?;

    println!(
        "Imported {}: {} new, {} updated, {} skipped ({} products total)",
        csv.display(),
        summary.inserted,
        summary.updated,
        summary.skipped,
        catalog.len()
    );
    Ok(())
}

async fn run_ingredients(
    config: &AppConfig,
    storage: &StorageManager,
    set_id: Option<String>,
    ndc: Option<String>,
    export: bool,
    policy: DuplicateSectionPolicy,
    debug: bool,
) -> Result<(), AppError> {
    let client = DailyMedClient::new(config)?;

    // Resolve the label to fetch
    let set_id = match (set_id, ndc) {
        (Some(set_id), _) => set_id.trim().to_string(),
        (None, Some(ndc)) => {
            let spls = client.find_set_ids_by_ndc(&ndc).await?;
            if spls.len() > 1 {
                tracing::warn!("NDC {} has {} labels, using the newest version", ndc, spls.len());
            }
            let newest = &spls[0];
            tracing::info!("Resolved NDC {} to {} ({})", ndc, newest.setid, newest.title);
            println!("Label page: {}", newest.label_page_url());
            newest.setid.clone()
        }
        (None, None) => return Err(AppError::Config("either --set-id or --ndc is required".to_string())),
    };

    // Raw markup is saved before parsing
    let label = client
        .fetch_label_with(&set_id, |xml| {
            if debug {
                if let Err(e) = storage.save_raw_label(&set_id, xml) {
                    tracing::warn!("Failed to save raw label: {}", e);
                }
            }
        })
        .await?;
    if debug {
        if let Err(e) = storage.save_label_tree(&set_id, &label) {
            tracing::warn!("Failed to save parsed label tree: {}", e);
        }
    }

    // Extract ingredients
    let ingredients = IngredientExtractor::with_policy(policy).extract(&label)?;
    let tag = storage.open_tag_store()?.get(&set_id)?;

    let title = label.title.clone().unwrap_or_default();
    println!("{}", if title.is_empty() { set_id.as_str() } else { title.as_str() });
    println!("Set id: {}", set_id);
    print_list("Active ingredients", &ingredients.active);
    print_list("Inactive ingredients", &ingredients.inactive);
    println!("Halal status: {}", tag.status);
    if !tag.notes.is_empty() {
        println!("Notes: {}", tag.notes);
    }

    if export {
        let record = ingredients.to_record(&set_id, &title);
        match storage.save_ingredient_export(&record) {
            Ok(path) => tracing::info!("Saved ingredient export to: {}", path.display()),
            Err(e) => tracing::error!("Failed to save ingredient export: {}", e),
        }
        match storage.save_ingredient_metadata(&record, &label, &ingredients) {
            Ok(path) => tracing::info!("Saved ingredient metadata to: {}", path.display()),
            Err(e) => tracing::error!("Failed to save ingredient metadata: {}", e),
        }
    }

    println!("{}", DISCLAIMER);
    Ok(())
}

fn print_list(heading: &str, items: &[String]) {
    println!("{}:", heading);
    if items.is_empty() {
        println!("  (none found)");
    }
    for item in items {
        println!("  - {}", item);
    }
}

fn run_tag(storage: &StorageManager, action: TagAction) -> Result<(), AppError> {
    let mut store = storage.open_tag_store()?;
    match action {
        TagAction::Get { id } => {
            let tag = store.get(&id)?;
            println!("{}\t{}\t{}", id, tag.status, tag.notes);
        }
        TagAction::Set { id, status, notes } => {
            store.set(&id, status, &notes)?;
            println!("Saved {} as {}", id, status);
        }
    }
    Ok(())
}
