// 🛒 catalog-sync - convert supplier article lists for the catalog
//
//   convert        extraction → catalog CSV, ledger updated, snapshot pending
//   mark-imported  confirm the last conversion; its snapshot becomes `previous`
//   ledger         show recorded manual changes
//   events         show the audit log

use anyhow::{Context, Result};
use catalog_sync::{
    get_events_for_entity, get_recent_events, insert_event, load_ledger, load_snapshot,
    open_database, promote_pending_snapshot, save_ledger, save_snapshot, CsvCatalogSnapshot,
    DownstreamCatalog, ImportConfig, ImportRun, JsonArticleSource, SnapshotKind,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "catalog-sync", version, about = "Supplier article import with manual change reconciliation")]
struct Cli {
    /// SQLite state database (ledger, snapshots, audit log)
    #[arg(long, global = true, value_name = "PATH", default_value = "catalog-sync.db")]
    db: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert an extraction into a catalog CSV
    Convert(ConvertArgs),
    /// Confirm the last conversion was imported into the catalog
    MarkImported(SupplierArgs),
    /// Print the manual change ledger of a supplier
    Ledger(SupplierArgs),
    /// Print the audit log
    Events(EventsArgs),
}

#[derive(Parser, Debug)]
struct ConvertArgs {
    /// Supplier configuration (JSON)
    #[arg(long, value_name = "PATH")]
    config: PathBuf,

    /// Extractor output (JSON array of articles)
    #[arg(long, value_name = "PATH")]
    input: PathBuf,

    /// Catalog export: a CSV file or a directory of `<catalog id>.csv`
    #[arg(long, value_name = "PATH")]
    downstream: Option<PathBuf>,

    /// Output CSV
    #[arg(long, value_name = "PATH")]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct SupplierArgs {
    /// Supplier identifier
    #[arg(long)]
    supplier: String,
}

#[derive(Parser, Debug)]
struct EventsArgs {
    /// Only events of this supplier's article (requires --supplier)
    #[arg(long, requires = "supplier")]
    article: Option<String>,

    #[arg(long)]
    supplier: Option<String>,

    /// Maximum number of events
    #[arg(long, default_value_t = 20)]
    limit: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert(args) => run_convert(&cli.db, args),
        Commands::MarkImported(args) => run_mark_imported(&cli.db, args),
        Commands::Ledger(args) => run_ledger(&cli.db, args),
        Commands::Events(args) => run_events(&cli.db, args),
    }
}

fn run_convert(db_path: &Path, args: ConvertArgs) -> Result<()> {
    println!("🔄 Converting articles");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = ImportConfig::from_file(&args.config)?;
    let conn = open_database(db_path)?;

    let mut ledger = load_ledger(&conn, &config.supplier)?;
    let previous = load_snapshot(&conn, &config.supplier, SnapshotKind::Previous)?;
    match &previous {
        Some(snapshot) => println!(
            "✓ Previous import: {} articles from {}",
            snapshot.articles.len(),
            snapshot.taken_at.format("%Y-%m-%d %H:%M")
        ),
        None => println!("✓ No previous import, first run"),
    }

    let source = JsonArticleSource::new(&args.input);
    let catalog = args.downstream.as_ref().map(CsvCatalogSnapshot::new);
    if catalog.is_none() {
        println!("⚠️  No --downstream given: manual changes made in the catalog since the last");
        println!("    import cannot be detected and will be overwritten by the new file.");
        println!("    Earlier recorded changes are still replayed from the ledger.");
    }
    let downstream = catalog.as_ref().map(|c| c as &dyn DownstreamCatalog);

    let mut outcome = ImportRun::new(&config).execute(
        &source,
        downstream,
        previous.as_ref().map(|s| s.articles.as_slice()),
        &mut ledger,
    )?;

    // Ledger first: the overrides must survive even if writing the CSV fails
    save_ledger(&conn, &config.supplier, &ledger)?;
    for event in outcome.ledger_events(&config.supplier) {
        insert_event(&conn, &event)?;
    }
    save_snapshot(&conn, &config.supplier, SnapshotKind::Pending, &outcome.extracted)?;

    let written = outcome.write_csv(&args.out)?;

    println!("✓ {}", outcome.report.summary());
    println!("✓ Wrote {} articles to {}", written, args.out.display());
    if outcome.ignored_count() > 0 {
        println!("✓ Skipped {} duplicates", outcome.ignored_count());
    }

    if !outcome.notifications.is_empty() {
        println!("\n📣 Notifications ({}):", outcome.notifications.len());
        for message in outcome.notifications.iter() {
            println!("  • {}", message);
        }
    }

    println!("\nRun `catalog-sync mark-imported --supplier {}` once the file is imported.", config.supplier);
    Ok(())
}

fn run_mark_imported(db_path: &Path, args: SupplierArgs) -> Result<()> {
    let conn = open_database(db_path)?;
    let count = promote_pending_snapshot(&conn, &args.supplier)
        .with_context(|| format!("Cannot mark {} as imported", args.supplier))?;

    println!("✅ {} articles of {} marked as imported", count, args.supplier);
    Ok(())
}

fn run_ledger(db_path: &Path, args: SupplierArgs) -> Result<()> {
    let conn = open_database(db_path)?;
    let ledger = load_ledger(&conn, &args.supplier)?;

    if ledger.is_empty() {
        println!("No manual changes recorded for {}", args.supplier);
        return Ok(());
    }

    println!(
        "📒 {} manual changes on {} articles",
        ledger.change_count(),
        ledger.article_count()
    );
    for (key, changes) in ledger.iter() {
        println!("\n{}", key);
        for (attribute, change) in changes {
            println!("  {:<14} {} → {}", attribute, change.replaced, change.manual);
        }
    }

    Ok(())
}

fn run_events(db_path: &Path, args: EventsArgs) -> Result<()> {
    let conn = open_database(db_path)?;

    let events = match (&args.supplier, &args.article) {
        (Some(supplier), Some(article)) => {
            get_events_for_entity(&conn, "article", &format!("{}/{}", supplier, article))?
        }
        (supplier, _) => {
            let prefix = supplier.as_ref().map(|s| format!("{}/", s));
            get_recent_events(&conn, prefix.as_deref(), args.limit)?
        }
    };

    for event in events.iter().take(args.limit) {
        println!(
            "{}  {:<24} {:<24} {}",
            event.timestamp.format("%Y-%m-%d %H:%M:%S"),
            event.event_type,
            event.entity_id,
            event.data
        );
    }

    Ok(())
}
