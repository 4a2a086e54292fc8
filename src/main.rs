use anyhow::{Context, Result};
use local_search_service::storage::memory::MemoryPrefStore;
use local_search_service::storage::PrefStore;
use local_search_service::{
    Backend, Content, Data, IndexId, LocalSearchService, ResponseStatus, SearchConfig,
};
use std::sync::Arc;

fn sample_documents() -> Vec<Data> {
    vec![
        Data::new(
            "bluetooth",
            vec![
                Content::new("title", "Bluetooth", 1.0),
                Content::new("body", "Pair and manage nearby Bluetooth devices", 0.5),
            ],
        ),
        Data::new(
            "display",
            vec![
                Content::new("title", "Displays", 1.0),
                Content::new("body", "Adjust screen brightness, resolution and night light", 0.5),
            ],
        ),
        Data::new(
            "network",
            vec![
                Content::new("title", "Wi-Fi networks", 1.0),
                Content::new("body", "Connect to known and nearby networks", 0.5),
            ],
        ),
        Data::new(
            "privacy",
            vec![
                Content::new("title", "Security and privacy", 1.0),
                Content::new("body", "Lock screen, passwords and site permissions", 0.5),
            ],
        ),
    ]
}

fn load_documents(path: &str) -> Result<Vec<Data>> {
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&json).with_context(|| format!("parsing documents in {path}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // A .env file is optional
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = SearchConfig::from_env()?;
    let mut args = std::env::args().skip(1);
    let query = args.next().unwrap_or_else(|| "brightnes".to_string());
    let documents = match args.next() {
        Some(path) => load_documents(&path)?,
        None => sample_documents(),
    };

    let prefs: Arc<dyn PrefStore> = Arc::new(MemoryPrefStore::new());
    let mut service = LocalSearchService::new(config, Some(prefs));
    let index = service.get_index(IndexId::CrosSettings, Backend::InvertedIndex)?;

    index.add_or_update(documents);
    index.wait_for_pending_updates().await;
    println!("Indexed {} documents", index.get_size());

    let mut results = Vec::new();
    match index.find(&query, 10, &mut results) {
        ResponseStatus::Success if results.is_empty() => {
            println!("No documents found for '{}'.", query);
        }
        ResponseStatus::Success => {
            println!("\nSearch results for '{}':", query);
            for result in &results {
                println!("ID: {}", result.id);
                println!("Score: {:.4}", result.score);
                for position in &result.positions {
                    println!(
                        "  {} @ {}..{}",
                        position.content_id,
                        position.start,
                        position.start + position.length
                    );
                }
                println!("-------------------");
            }
        }
        status => println!("Search not performed: {:?}", status),
    }

    Ok(())
}
