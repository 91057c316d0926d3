use ballistic_market_api::{config::AppConfig, models::NewProduct, storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let storage = storage::connect(&config).await?;

    if !storage.list_active_products().await?.is_empty() {
        println!("Products already present, nothing to seed");
        return Ok(());
    }

    let products = vec![
        ("AK-47", "Reliable assault rifle, lightly used", 125_000, "Weapons", 4),
        ("Kevlar Vest", "Stops most of what gets thrown at you", 45_000, "Armor", 10),
        ("Rifle Scope", "4x magnification, zeroed", 20_000, "Attachments", 8),
        ("9mm Ammo Box", "50 rounds per box", 2_500, "Ammunition", 60),
    ];

    for (name, description, price, category, stock_quantity) in products {
        let product = storage
            .create_product(&NewProduct {
                name: name.to_string(),
                description: description.to_string(),
                price,
                image_url: None,
                category: category.to_string(),
                stock_quantity,
            })
            .await?;
        println!("Seeded product #{}: {}", product.id, product.name);
    }

    Ok(())
}
