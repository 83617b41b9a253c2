//! # Seed Data Generator
//!
//! Populates the database with demo members, books and products.
//!
//! ## Usage
//! ```bash
//! # 40 books (default) into STOCKROOM_DATABASE_PATH or ./stockroom.db
//! cargo run -p stockroom-db --bin seed
//!
//! # Custom amount and location
//! cargo run -p stockroom-db --bin seed -- --books 200 --db ./data/stockroom.db
//! ```
//!
//! Books get 1-3 copies each. The first few members get an open loan so
//! availability is visible straight away. Products are priced between
//! 1.50 and 24.99.

use std::env;
use std::path::PathBuf;

use stockroom_db::{init_tracing, AppConfig, Database};
use tracing::{info, warn};

const DEFAULT_BOOK_COUNT: usize = 40;

const MEMBERS: &[(&str, &str)] = &[
    ("Anna Kowalska", "anna.kowalska@example.com"),
    ("Jan Nowak", "jan.nowak@example.com"),
    ("Maria Wisniewska", "maria.wisniewska@example.com"),
    ("Piotr Zielinski", "piotr.zielinski@example.com"),
    ("Ewa Lewandowska", "ewa.lewandowska@example.com"),
];

const TITLES: &[(&str, &str)] = &[
    ("Solaris", "Stanislaw Lem"),
    ("The Cyberiad", "Stanislaw Lem"),
    ("Quo Vadis", "Henryk Sienkiewicz"),
    ("The Doll", "Boleslaw Prus"),
    ("Pan Tadeusz", "Adam Mickiewicz"),
    ("Dune", "Frank Herbert"),
    ("Emma", "Jane Austen"),
    ("Middlemarch", "George Eliot"),
    ("The Left Hand of Darkness", "Ursula K. Le Guin"),
    ("Flights", "Olga Tokarczuk"),
];

const PRODUCTS: &[(&str, i64)] = &[
    ("Notebook A5", 450),
    ("Fountain Pen", 2499),
    ("Bookmark Set", 150),
    ("Canvas Tote", 1299),
    ("Reading Lamp", 2350),
    ("Coffee Mug", 999),
    ("Gift Card", 2000),
    ("Book Light", 1575),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut config = AppConfig::from_env()?;
    let mut books: usize = DEFAULT_BOOK_COUNT;

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--books" | "-b" => {
                if let Some(value) = args.get(i + 1) {
                    books = value.parse().unwrap_or(DEFAULT_BOOK_COUNT);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if let Some(value) = args.get(i + 1) {
                    config.database_path = PathBuf::from(value);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -b, --books <N>    Number of books to generate (default: {DEFAULT_BOOK_COUNT})");
                println!("  -d, --db <PATH>    Database file path (default: $STOCKROOM_DATABASE_PATH or ./stockroom.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(arg = other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    println!("Stockroom Seed Data Generator");
    println!("=============================");
    println!("Database: {}", config.database_path.display());
    println!("Books:    {books}");
    println!();

    let db = Database::new(config.db_config()).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.books().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {existing} books");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();

    let mut member_ids = Vec::with_capacity(MEMBERS.len());
    for (name, email) in MEMBERS {
        let member = db.members().create(name, email).await?;
        member_ids.push(member.id);
    }
    println!("✓ {} members", member_ids.len());

    let mut book_ids = Vec::with_capacity(books);
    for n in 0..books {
        let (title, author) = TITLES[n % TITLES.len()];
        let title = match n / TITLES.len() {
            0 => title.to_string(),
            edition => format!("{title} (vol. {})", edition + 1),
        };
        let copies = 1 + (n % 3) as i64;

        match db.books().create(&title, author, Some(copies)).await {
            Ok(book) => book_ids.push(book.id),
            Err(e) => eprintln!("Failed to insert {title}: {e}"),
        }
    }
    println!("✓ {} books", book_ids.len());

    for (name, price_cents) in PRODUCTS {
        db.products().create(name, *price_cents).await?;
    }
    println!("✓ {} products", PRODUCTS.len());

    let loans = db.loans().with_default_loan_days(config.default_loan_days);
    let mut lent = 0;
    for (member_id, book_id) in member_ids.iter().zip(book_ids.iter()).take(3) {
        loans.borrow(*book_id, *member_id, None).await?;
        lent += 1;
    }
    println!("✓ {lent} open loans");

    let elapsed = start.elapsed();
    info!(books = book_ids.len(), ?elapsed, "Seed complete");

    println!();
    println!("✓ Seed complete in {elapsed:?}");

    Ok(())
}
