use chrono::Utc;
use clap::Parser;
use serde::Serialize;
use tracing::{debug, info};

use libris::{config::Config, db::Database, export, queries, schema, seed};

#[derive(Parser, Debug)]
#[command(
    name = "libris",
    about = "Seeds a MongoDB library catalog and runs its aggregation queries"
)]
struct Cli {
    /// Regular expression applied to book titles by the pattern-match query
    #[arg(long, default_value = "a{1}")]
    title_pattern: String,

    /// Lower inclusive bound on joined author ages
    #[arg(long, default_value_t = 50)]
    min_age: i64,

    /// Upper inclusive bound on joined author ages
    #[arg(long, default_value_t = 150)]
    max_age: i64,

    /// Skip seeding and query the store as-is
    #[arg(long)]
    skip_seed: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let db = Database::connect(&config).await?;
    info!("connected to database '{}'", config.database);
    debug!("visible databases: {:?}", db.list_database_names().await?);

    schema::ensure_collection(&db, &schema::CollectionSpec::author()).await?;
    schema::ensure_collection(&db, &schema::CollectionSpec::book()).await?;

    if cli.skip_seed {
        info!("seeding skipped");
    } else {
        let summary = seed::seed(&db, seed::SeedData::sample()).await?;
        info!(
            "seeded {} authors and {} books",
            summary.authors_inserted, summary.books_inserted
        );
    }

    let books = queries::books_matching_title(&db, &cli.title_pattern).await?;
    print_results(
        &format!("books with titles matching /{}/", cli.title_pattern),
        &books,
    )?;

    let joined = queries::authors_with_books(&db).await?;
    print_results("authors with their books", &joined)?;

    let counts = queries::author_book_counts(&db).await?;
    print_results("book count per author", &counts)?;

    let today = Utc::now().date_naive();
    let aged =
        queries::books_with_author_ages(&db, cli.min_age, cli.max_age, today).await?;
    print_results(
        &format!(
            "books whose authors are all {}..={} years old",
            cli.min_age, cli.max_age
        ),
        &aged,
    )?;

    // Tabular export demo: the same author rows in all three shapes.
    let authors = db.all_authors().await?;
    let frame = export::AuthorFrame::from_authors(&authors);
    println!("=== authors as a labeled table ({} rows)", frame.len());
    print!("{}", frame);

    let columns = export::AuthorColumns::from_authors(&authors);
    println!("=== authors as columnar arrays");
    println!("{:?}", columns);
    println!("=== dates of birth as epoch milliseconds");
    println!("{:?}", columns.date_of_birth_epoch_ms());

    Ok(())
}

fn print_results<T: Serialize>(label: &str, items: &[T]) -> Result<(), serde_json::Error> {
    println!("=== {} ({} rows)", label, items.len());
    println!("{}", serde_json::to_string_pretty(items)?);
    Ok(())
}
