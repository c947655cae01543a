//! Example: Load the site registry and summarize it by category.
//!
//! Pass a path to read a local copy instead of fetching the default source:
//! `cargo run -p handlescan-registry --example load-registry -- wmn-data.json`

use handlescan_core::RegistryConfig;
use handlescan_registry::RegistryLoader;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = RegistryConfig::default();
    if let Some(path) = std::env::args().nth(1) {
        config.local_path = Some(path.into());
    }

    let loader = RegistryLoader::from_config(&config);
    println!("Loading site registry from {:?}...\n", loader.source());

    let registry = loader.load_registry().await?;

    println!("Loaded {} site definitions", registry.count());
    println!("  flagged invalid: {}\n", registry.invalid_count());

    for (category, count) in registry.count_by_category() {
        let label = if category.is_empty() { "(none)" } else { &category };
        println!("  {label:<16} {count}");
    }

    if let Some(first) = registry.sites().first() {
        println!("\nFirst entry: {} -> {}", first.name, first.check_uri);
    }

    Ok(())
}
