use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres URL. When unset the embedded SQLite store at `db_path` is used.
    pub database_url: Option<String>,
    pub db_path: String,
    pub host: String,
    pub port: u16,
    pub server_url: String,
    pub client_url: String,
    pub steam_api_key: String,
    pub upload_dir: String,
    pub email: Option<EmailConfig>,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
    pub admin_address: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
        let db_path = env::var("DB_PATH").unwrap_or_else(|_| "./database.sqlite".to_string());
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(5000);
        let server_url =
            env::var("SERVER_URL").unwrap_or_else(|_| format!("http://localhost:{port}"));
        let client_url =
            env::var("CLIENT_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let steam_api_key = env::var("STEAM_API_KEY").unwrap_or_default();
        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string());

        Ok(Self {
            database_url,
            db_path,
            host,
            port,
            server_url,
            client_url,
            steam_api_key,
            upload_dir,
            email: EmailConfig::from_env(),
        })
    }
}

impl EmailConfig {
    // Mail delivery is optional; the server runs without it.
    fn from_env() -> Option<Self> {
        let host = env::var("EMAIL_HOST").ok().filter(|h| !h.is_empty())?;
        let port = env::var("EMAIL_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(587);
        let username = env::var("EMAIL_USER").unwrap_or_default();
        let password = env::var("EMAIL_PASS").unwrap_or_default();
        let from_address = env::var("EMAIL_FROM").ok()?;
        let admin_address = env::var("ADMIN_EMAIL").ok()?;

        Some(Self {
            host,
            port,
            username,
            password,
            from_address,
            admin_address,
        })
    }
}
