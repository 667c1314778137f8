use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{Catalog, CatalogOptions};
use server::{Config, MatchStrategy, Recommendation, RecommendationService};
use similarity::{build_model, ModelStore, TagEncoder};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::info;

/// ReelRecs - Movie Recommendation Engine
#[derive(Parser)]
#[command(name = "reel-recs")]
#[command(about = "Content-based movie recommendations from genre tags", long_about = None)]
struct Cli {
    /// Catalog CSV file (overrides RECS_DATA_PATH)
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    /// Directory for the similarity matrix and vocabulary (overrides RECS_MODEL_DIR)
    #[arg(short, long, global = true)]
    model_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean the catalog, build the similarity matrix and save it
    Train,

    /// Get movies similar to a title
    Recommend {
        /// Movie title (exact, or any part of it)
        #[arg(long)]
        title: String,

        /// Number of recommendations to return
        #[arg(long, default_value = "5")]
        top_n: usize,
    },

    /// Search for movies by title
    Search {
        /// Movie title to search for (case-insensitive substring match)
        #[arg(long)]
        title: String,

        /// Maximum number of results
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Show what loading and cleaning the catalog did
    Summary,

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "1000")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(data) = cli.data {
        config.data_path = data;
    }
    if let Some(model_dir) = cli.model_dir {
        config.model_dir = model_dir;
    }

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Train => handle_train(&config)?,
        Commands::Recommend { title, top_n } => {
            let service = load_service(&config)?;
            handle_recommend(&service, &title, top_n)?
        }
        Commands::Search { title, limit } => {
            let service = load_service(&config)?;
            handle_search(&service, &title, limit)?
        }
        Commands::Summary => handle_summary(&config)?,
        Commands::Benchmark {
            requests,
            concurrent,
        } => {
            let service = Arc::new(load_service(&config)?);
            handle_benchmark(service, requests, concurrent).await?
        }
    }

    Ok(())
}

/// Load the catalog and the saved matrix
fn load_service(config: &Config) -> Result<RecommendationService> {
    println!("Loading catalog from {}...", config.data_path.display());
    let start = Instant::now();
    let service = RecommendationService::load(
        &config.data_path,
        &config.catalog_options(),
        &config.model_dir,
    )
    .context("Failed to load the recommendation model")?;
    println!(
        "{} Loaded {} movies in {:?}",
        "✓".green(),
        service.len(),
        start.elapsed()
    );
    Ok(service)
}

fn load_catalog(config: &Config) -> Result<Catalog> {
    let options: CatalogOptions = config.catalog_options();
    Catalog::load(&config.data_path, &options).with_context(|| {
        format!(
            "Failed to load catalog from {}. It needs the columns: {}, {}, {}",
            config.data_path.display(),
            options.columns.id,
            options.columns.title,
            options.columns.tags
        )
    })
}

/// Handle the 'train' command
fn handle_train(config: &Config) -> Result<()> {
    println!("{}", "Step 1: Loading and cleaning data...".bold().blue());
    let catalog = load_catalog(config)?;
    print_summary(&catalog);

    println!("{}", "Step 2: Building similarity matrix...".bold().blue());
    let start = Instant::now();
    let encoder = TagEncoder::new().with_delimiter(config.delimiter());
    let model = build_model(&catalog, encoder).context("Failed to build the similarity matrix")?;
    println!(
        "{} {} x {} matrix over {} tags in {:?}",
        "✓".green(),
        model.matrix.n(),
        model.matrix.n(),
        model.vocabulary.vocabulary.len(),
        start.elapsed()
    );

    println!("{}", "Step 3: Saving model...".bold().blue());
    let store = ModelStore::new(&config.model_dir);
    let paths = store
        .save(&model.matrix, &model.vocabulary)
        .context("Failed to save the model")?;

    println!("{} Processed {} movies", "✓".green(), catalog.len());
    println!("{} Matrix saved to {}", "✓".green(), paths.matrix.display());
    println!("{} Vocabulary saved to {}", "✓".green(), paths.vocabulary.display());
    println!("{} You can now run: recs-server", "✓".green());
    Ok(())
}

/// Handle the 'recommend' command
fn handle_recommend(service: &RecommendationService, title: &str, top_n: usize) -> Result<()> {
    let resolved = service.resolve(title)?;
    if resolved.strategy == MatchStrategy::Substring {
        println!("Using closest match: {}", resolved.title.yellow());
    }

    let recommendations = service.neighbors(resolved.position, top_n);
    if recommendations.is_empty() {
        println!("No other movies to compare '{}' with", resolved.title);
        return Ok(());
    }

    print_recommendations(&resolved.title, &recommendations);
    Ok(())
}

/// Handle the 'search' command
fn handle_search(service: &RecommendationService, title: &str, limit: usize) -> Result<()> {
    let hits = service.search(title, limit)?;

    println!("{}", format!("Search results for '{}':", title.trim()).bold().blue());
    if hits.is_empty() {
        println!("No movies match '{}'", title.trim());
        return Ok(());
    }
    for hit in &hits {
        let marker = match hit.strategy {
            MatchStrategy::Exact => "exact".green(),
            MatchStrategy::Substring => "partial".normal(),
        };
        println!(
            "{}: {} [{}] ({})",
            hit.item_id,
            hit.title,
            hit.tags.join(", "),
            marker
        );
    }
    Ok(())
}

/// Handle the 'summary' command
fn handle_summary(config: &Config) -> Result<()> {
    let catalog = load_catalog(config)?;
    print_summary(&catalog);

    let store = ModelStore::new(&config.model_dir);
    if store.exists() {
        let state = store.load_vocabulary()?;
        println!(
            "{}Saved model: {} tags in vocabulary ({})",
            "• ".green(),
            state.vocabulary.len(),
            store.model_dir().display()
        );
    } else {
        println!("{}No saved model in {}", "• ".yellow(), store.model_dir().display());
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    service: Arc<RecommendationService>,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    if service.is_empty() {
        return Err(anyhow!("Catalog is empty, nothing to benchmark"));
    }

    // Random titles from the catalog
    let n = service.len();
    let titles: Vec<String> = (0..requests)
        .filter_map(|_| {
            let position = rand::random::<u32>() as usize % n;
            service.catalog().get(position).map(|item| item.title.clone())
        })
        .collect();

    info!("Running {} lookups, {} at a time", titles.len(), concurrent);

    let permits = Arc::new(Semaphore::new(concurrent.max(1)));
    let wall = Instant::now();
    let mut handles = vec![];
    for title in titles {
        let service = service.clone();
        let permit = permits.clone().acquire_owned().await?;
        let handle = tokio::task::spawn_blocking(move || {
            let start = Instant::now();
            let result = service.recommend(&title, 5);
            drop(permit);
            result.map(|_| start.elapsed())
        });
        handles.push(handle);
    }

    // Wait for all tasks to complete and collect timings
    let mut timings = vec![];
    for handle in handles {
        timings.push(handle.await??);
    }
    let total_time = wall.elapsed();

    if timings.is_empty() {
        println!("No requests were made");
        return Ok(());
    }

    timings.sort();
    let sum: Duration = timings.iter().sum();
    let avg_latency = sum / timings.len() as u32;
    let throughput = timings.len() as f64 / total_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {}", timings.len());
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(&timings, 0.50));
    println!("P95 latency: {:?}", percentile(&timings, 0.95));
    println!("P99 latency: {:?}", percentile(&timings, 0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Nearest-rank percentile of sorted timings
fn percentile(sorted: &[Duration], p: f64) -> Duration {
    let rank = ((sorted.len() as f64 * p).ceil() as usize).clamp(1, sorted.len());
    sorted[rank - 1]
}

fn print_summary(catalog: &Catalog) {
    let report = catalog.report();

    println!("{}", "Dataset summary:".bold().blue());
    println!("{}Total movies: {}", "• ".green(), report.items);
    println!("{}Records read: {}", "• ".green(), report.raw_records);
    println!("{}Ids filled forward: {}", "• ".cyan(), report.filled_ids);
    println!("{}Titles filled as 'Unknown': {}", "• ".cyan(), report.filled_titles);
    println!("{}Records without tags: {}", "• ".cyan(), report.filled_tags);
    println!("{}Duplicates removed: {}", "• ".cyan(), report.duplicates_removed);

    // Most common tags
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for item in catalog.iter() {
        for tag in &item.tags {
            *counts.entry(tag.as_str()).or_insert(0) += 1;
        }
    }
    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    println!("Top tags:");
    for (tag, count) in counts.iter().take(10) {
        println!("  - {}: {} movies", tag, count);
    }

    println!("First few rows:");
    for item in catalog.iter().take(3) {
        println!("  {} | {} | {}", item.id, item.title, item.tags.join("|"));
    }
}

/// Helper function to format and print recommendations
fn print_recommendations(query: &str, recommendations: &[Recommendation]) {
    println!("{}", format!("Movies similar to '{}':", query).bold().blue());
    for (i, rec) in recommendations.iter().enumerate() {
        println!(
            "{}. {} [{}] - Score: {:.4}",
            (i + 1).to_string().green(),
            rec.title,
            rec.tags.join(", "),
            rec.score
        );
    }
}
