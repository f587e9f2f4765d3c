use std::net::SocketAddr;

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub db_max_connections: u32,
    pub secret_key: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://movies.db?mode=rwc".to_string());

        let db_max_connections =
            parse_max_connections(std::env::var("DB_MAX_CONNECTIONS").ok().as_deref())?;

        let secret_key = std::env::var("SECRET_KEY").unwrap_or_default();

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            db_max_connections,
            secret_key,
        })
    }
}

fn parse_max_connections(raw: Option<&str>) -> anyhow::Result<u32> {
    let Some(raw) = raw else {
        return Ok(5);
    };
    let value: u32 = raw.trim().parse().context("DB_MAX_CONNECTIONS")?;
    if value == 0 {
        anyhow::bail!("DB_MAX_CONNECTIONS must be at least 1");
    }
    Ok(value)
}
