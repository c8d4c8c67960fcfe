use army_store::catalog::{
    seed_catalog, vocabulary, Product, ProductPatch, ProductService, SearchCriteria,
    DEFAULT_FEATURED_LIMIT,
};
use army_store::engine::FileSubstrate;
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, env = "ARMY_STORE_DATA_DIR", default_value = "data")]
    data_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Clone)]
enum Commands {
    /// List every product.
    List,
    Get { id: String },
    /// Create a product from a JSON object.
    Create { product: String },
    /// Apply a JSON patch to a product.
    Update { id: String, patch: String },
    Delete { id: String },
    Search {
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        min_price: Option<f64>,
        #[arg(long)]
        max_price: Option<f64>,
        #[arg(long)]
        in_stock: bool,
        #[arg(long)]
        category: Option<String>,
    },
    Featured {
        #[arg(short, long, default_value_t = DEFAULT_FEATURED_LIMIT)]
        limit: usize,
    },
    /// Populate an empty catalog with sample products.
    Seed,
    /// Print the category, size, color and material vocabularies.
    Vocabulary,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let service = ProductService::open(FileSubstrate::new(&cli.data_dir)?)?;

    match cli.command {
        Commands::List => print_json(&service.get_all_products()?)?,
        Commands::Get { id } => match service.get_product_by_id(&id)? {
            Some(product) => print_json(&product)?,
            None => anyhow::bail!("product {} not found", id),
        },
        Commands::Create { product } => {
            let product: Product = serde_json::from_str(&product)?;
            print_json(&service.create_product(&product)?)?;
        }
        Commands::Update { id, patch } => {
            let patch: ProductPatch = serde_json::from_str(&patch)?;
            match service.update_product(&id, &patch)? {
                Some(product) => print_json(&product)?,
                None => anyhow::bail!("product {} not found", id),
            }
        }
        Commands::Delete { id } => {
            if !service.delete_product(&id)? {
                anyhow::bail!("product {} not found", id);
            }
            println!("OK");
        }
        Commands::Search {
            text,
            min_price,
            max_price,
            in_stock,
            category,
        } => {
            let mut criteria = SearchCriteria {
                search_text: text,
                min_price,
                max_price,
                in_stock,
                ..SearchCriteria::default()
            };
            if let Some(category) = category {
                criteria = criteria.filter("category", category);
            }
            print_json(&service.search_products(&criteria)?)?;
        }
        Commands::Featured { limit } => print_json(&service.get_featured_products(limit)?)?,
        Commands::Seed => {
            let products = seed_catalog(&service, &mut rand::thread_rng())?;
            println!("{} products in catalog", products.len());
        }
        Commands::Vocabulary => print_json(&serde_json::json!({
            "categories": vocabulary::CATEGORIES,
            "sizes": vocabulary::SIZES,
            "colors": vocabulary::COLORS,
            "materials": vocabulary::MATERIALS,
        }))?,
    }

    Ok(())
}
