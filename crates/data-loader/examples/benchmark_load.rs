use data_loader::{Catalog, CatalogOptions};
use std::path::Path;
use std::time::Instant;

fn main() {
    let path = Path::new("data/movies.csv");

    println!("Loading movie catalog...\n");

    let start = Instant::now();
    let catalog = Catalog::load(path, &CatalogOptions::default())
        .expect("Failed to load catalog");
    let elapsed = start.elapsed();

    let report = catalog.report();

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Records read: {}", report.raw_records);
    println!("Items kept: {}", report.items);
    println!("Duplicates removed: {}", report.duplicates_removed);
    println!("\nPerformance: {:.0} records/second",
             report.raw_records as f64 / elapsed.as_secs_f64());
}
