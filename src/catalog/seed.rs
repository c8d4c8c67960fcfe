//! Synthetic catalog used to populate an empty store on first run.

use chrono::Utc;
use log::info;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{json, Value};

use crate::catalog::product::{default_product, Product, Variations};
use crate::catalog::service::ProductService;
use crate::catalog::vocabulary::{letter_sizes, COLORS};
use crate::{Result, Substrate};

/// Chance that a sample not marked featured is featured anyway.
const FEATURED_PROBABILITY: f64 = 0.3;

#[derive(Debug, Clone, Copy)]
enum Pool {
    Colors,
    LetterSizes,
    Values(&'static [&'static str]),
}

impl Pool {
    fn values(self) -> Vec<&'static str> {
        match self {
            Pool::Colors => COLORS.iter().map(|c| c.name).collect(),
            Pool::LetterSizes => letter_sizes().collect(),
            Pool::Values(values) => values.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Pick {
    All(Pool),
    /// Between one and `n` distinct values.
    UpTo(Pool, usize),
}

impl Pick {
    fn draw<R: Rng + ?Sized>(self, rng: &mut R) -> Vec<String> {
        let picked = match self {
            Pick::All(pool) => pool.values(),
            Pick::UpTo(pool, n) => {
                let mut values = pool.values();
                values.shuffle(rng);
                values.truncate(rng.gen_range(1..=n.max(1)));
                values
            }
        };
        picked.into_iter().map(str::to_string).collect()
    }
}

#[derive(Debug)]
struct Sample {
    name: &'static str,
    description: &'static str,
    price: (u64, u64),
    category: &'static str,
    /// Minimum stock and the width of the random range above it.
    stock: (i64, i64),
    colors: Pick,
    sizes: Pick,
    materials: Pick,
    featured: bool,
}

const SAMPLES: &[Sample] = &[
    Sample {
        name: "Chaleco Táctico Multifuncional",
        description: "Chaleco táctico fabricado con materiales de alta resistencia, perfecto para operaciones militares y actividades al aire libre. Múltiples bolsillos y configuraciones.",
        price: (150_000, 450_000),
        category: "tactical",
        stock: (5, 30),
        colors: Pick::UpTo(Pool::Colors, 3),
        sizes: Pick::UpTo(Pool::LetterSizes, 4),
        materials: Pick::UpTo(Pool::Values(&["Cordura", "Nylon", "Poliéster"]), 2),
        featured: false,
    },
    Sample {
        name: "Botas de Combate Impermeables",
        description: "Botas militares de alto rendimiento con suela antideslizante y material impermeable. Diseñadas para terrenos difíciles y condiciones extremas.",
        price: (280_000, 520_000),
        category: "tactical",
        stock: (10, 40),
        colors: Pick::UpTo(Pool::Values(&["Negro", "Marrón Táctico", "Tan"]), 3),
        sizes: Pick::UpTo(Pool::Values(&["38", "40", "42", "44", "46"]), 5),
        materials: Pick::UpTo(Pool::Values(&["Cuero", "Gore-Tex", "Cordura"]), 2),
        featured: false,
    },
    Sample {
        name: "Mochila Táctica 50L",
        description: "Mochila de alta capacidad con sistema MOLLE para accesorios adicionales. Ideal para operaciones tácticas de larga duración y expediciones.",
        price: (200_000, 380_000),
        category: "tactical",
        stock: (5, 25),
        colors: Pick::UpTo(Pool::Values(&["Negro", "Verde Militar", "Tan", "Camo"]), 4),
        sizes: Pick::All(Pool::Values(&["50L"])),
        materials: Pick::UpTo(Pool::Values(&["Cordura", "Nylon Ripstop", "Poliéster"]), 2),
        featured: true,
    },
    Sample {
        name: "Casco Balístico Nivel IIIA",
        description: "Casco de protección balística certificado para detener proyectiles de hasta nivel IIIA. Incluye sistema de ajuste rápido y rieles para accesorios.",
        price: (800_000, 1_200_000),
        category: "protection",
        stock: (3, 15),
        colors: Pick::UpTo(Pool::Values(&["Negro", "Verde Militar", "Tan"]), 3),
        sizes: Pick::UpTo(Pool::Values(&["M", "L", "XL"]), 3),
        materials: Pick::All(Pool::Values(&["Kevlar", "Polietileno"])),
        featured: false,
    },
    Sample {
        name: "Uniforme Camuflaje Bosque",
        description: "Uniforme militar con patrón de camuflaje para entornos boscosos. Confeccionado con telas resistentes a la abrasión y de secado rápido.",
        price: (120_000, 250_000),
        category: "uniform",
        stock: (20, 50),
        colors: Pick::All(Pool::Values(&["Verde Militar", "Camo"])),
        sizes: Pick::UpTo(Pool::LetterSizes, 5),
        materials: Pick::All(Pool::Values(&["Algodón", "Poliéster", "Ripstop"])),
        featured: false,
    },
    Sample {
        name: "Gafas Tácticas Balísticas",
        description: "Gafas de protección con resistencia al impacto balístico. Lentes intercambiables para diferentes condiciones de luz y protección UV.",
        price: (90_000, 180_000),
        category: "accessories",
        stock: (15, 35),
        colors: Pick::UpTo(Pool::Values(&["Negro", "Tan"]), 2),
        sizes: Pick::All(Pool::Values(&["Única"])),
        materials: Pick::All(Pool::Values(&["Policarbonato", "Nylon"])),
        featured: true,
    },
    Sample {
        name: "Radio Táctica de 2 Vías",
        description: "Radio de comunicación táctica con encriptación y largo alcance. Resistente al agua y con batería de larga duración.",
        price: (350_000, 650_000),
        category: "accessories",
        stock: (8, 20),
        colors: Pick::All(Pool::Values(&["Negro"])),
        sizes: Pick::All(Pool::Values(&["Única"])),
        materials: Pick::All(Pool::Values(&["Plástico Reforzado", "Metal"])),
        featured: false,
    },
    Sample {
        name: "Sleeping Bag Militar -20°C",
        description: "Saco de dormir para condiciones extremas, diseñado para temperaturas de hasta -20°C. Material impermeable y aislamiento térmico avanzado.",
        price: (180_000, 350_000),
        category: "camping",
        stock: (10, 25),
        colors: Pick::UpTo(Pool::Values(&["Verde Militar", "Negro", "Tan"]), 3),
        sizes: Pick::All(Pool::Values(&["Única"])),
        materials: Pick::All(Pool::Values(&["Nylon", "Poliéster", "Gore-Tex"])),
        featured: false,
    },
    Sample {
        name: "Guantes Tácticos Reforzados",
        description: "Guantes con protección para nudillos y palma reforzada. Permiten el uso de pantallas táctiles mientras ofrecen protección y agarre.",
        price: (70_000, 135_000),
        category: "accessories",
        stock: (20, 40),
        colors: Pick::UpTo(Pool::Values(&["Negro", "Verde Militar", "Tan"]), 3),
        sizes: Pick::UpTo(Pool::Values(&["S", "M", "L", "XL"]), 4),
        materials: Pick::All(Pool::Values(&["Cuero", "Kevlar", "Nylon"])),
        featured: true,
    },
    Sample {
        name: "Tienda de Campaña 4 Personas",
        description: "Tienda militar para 4 personas, impermeable y con camuflaje. Ideal para campamentos de base y operaciones prolongadas.",
        price: (320_000, 580_000),
        category: "camping",
        stock: (5, 15),
        colors: Pick::UpTo(Pool::Values(&["Verde Militar", "Camo"]), 2),
        sizes: Pick::All(Pool::Values(&["4 Personas"])),
        materials: Pick::All(Pool::Values(&["Nylon Ripstop", "Poliéster", "Aluminio"])),
        featured: false,
    },
    Sample {
        name: "Kit de Primeros Auxilios Táctico",
        description: "Kit completo de primeros auxilios en bolsa MOLLE compatible. Incluye suministros para tratamiento de emergencia en campo.",
        price: (120_000, 220_000),
        category: "accessories",
        stock: (15, 30),
        colors: Pick::UpTo(Pool::Values(&["Verde Militar", "Negro", "Tan"]), 3),
        sizes: Pick::All(Pool::Values(&["Única"])),
        materials: Pick::All(Pool::Values(&["Cordura", "Nylon"])),
        featured: false,
    },
    Sample {
        name: "Cuchillo Táctico Multifunción",
        description: "Cuchillo de supervivencia con hoja de acero inoxidable y empuñadura ergonómica. Incluye funda MOLLE y afilador.",
        price: (90_000, 180_000),
        category: "accessories",
        stock: (10, 25),
        colors: Pick::UpTo(Pool::Values(&["Negro", "Verde Militar"]), 2),
        sizes: Pick::All(Pool::Values(&["Única"])),
        materials: Pick::All(Pool::Values(&["Acero Inoxidable", "Goma", "Nylon"])),
        featured: false,
    },
];

pub fn sample_count() -> usize {
    SAMPLES.len()
}

/// A price in `[min, max]` rounded up to the next thousand, minus 100 or 10.
pub fn random_price<R: Rng + ?Sized>(min: u64, max: u64, rng: &mut R) -> u64 {
    let price = rng.gen_range(min..=max.max(min));
    let rounded = price.div_ceil(1000) * 1000;
    let discount = if rng.gen_bool(0.5) { 100 } else { 10 };
    rounded.saturating_sub(discount)
}

/// An image-host style attachment pointing at a picsum photo.
pub fn sample_image(index: u32, width: u32, height: u32) -> Value {
    let image_id = (index * 13) % 1000 + 1;
    let filename = format!("product_{}.jpg", index);
    let name = format!("product_{}", index);

    let base_url = format!("https://picsum.photos/id/{}", image_id);
    let main_url = format!("{}/{}/{}", base_url, width, height);
    let variant = |url: String| {
        json!({
            "filename": filename,
            "name": name,
            "mime": "image/jpeg",
            "extension": "jpg",
            "url": url,
        })
    };

    json!({
        "data": {
            "id": format!("pic{}", image_id),
            "title": filename,
            "url_viewer": main_url,
            "url": main_url,
            "display_url": main_url,
            "width": width,
            "height": height,
            "size": u64::from(width) * u64::from(height) / 10,
            "time": Utc::now().timestamp(),
            "expiration": "0",
            "image": variant(main_url.clone()),
            "thumb": variant(format!("{}/200/200", base_url)),
            "medium": variant(format!("{}/400/300", base_url)),
            "delete_url": "#",
        }
    })
}

fn build_product<R: Rng + ?Sized>(sample: &Sample, index: u32, rng: &mut R) -> Product {
    let (min_stock, spread) = sample.stock;
    Product {
        name: sample.name.to_string(),
        description: sample.description.to_string(),
        price: random_price(sample.price.0, sample.price.1, rng) as f64,
        stock: min_stock + rng.gen_range(0..spread.max(1)),
        category: sample.category.to_string(),
        variations: Variations {
            colors: sample.colors.draw(rng),
            sizes: sample.sizes.draw(rng),
            materials: sample.materials.draw(rng),
        },
        image: Some(sample_image(index, 800, 600)),
        active: true,
        featured: sample.featured || rng.gen_bool(FEATURED_PROBABILITY),
        ..default_product()
    }
}

/// Fills an empty product collection with the sample catalog.
///
/// Products go through [`ProductService::create_product`], so they are
/// validated like any other write. When products already exist nothing is
/// written and the existing products are returned.
pub fn seed_catalog<S, R>(service: &ProductService<S>, rng: &mut R) -> Result<Vec<Product>>
where
    S: Substrate,
    R: Rng + ?Sized,
{
    let existing = service.get_all_products()?;
    if !existing.is_empty() {
        info!("Catalog already seeded with {} products", existing.len());
        return Ok(existing);
    }

    let mut seeded = Vec::with_capacity(SAMPLES.len());
    for (index, sample) in (1u32..).zip(SAMPLES) {
        let product = build_product(sample, index, rng);
        seeded.push(service.create_product(&product)?);
    }

    info!("Seeded catalog with {} products", seeded.len());
    Ok(seeded)
}
