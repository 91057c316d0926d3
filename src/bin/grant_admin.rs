use ballistic_market_api::{config::AppConfig, storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let steam_id = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: grant_admin <steam_id>"))?;

    let config = AppConfig::from_env()?;
    let storage = storage::connect(&config).await?;

    if storage.grant_admin(&steam_id).await? {
        println!("Granted admin to {steam_id}");
    } else {
        println!("No user with steam id {steam_id}; they must log in once first");
    }

    Ok(())
}
