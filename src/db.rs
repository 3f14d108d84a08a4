use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

const MAX_CONNECT_ATTEMPTS: u32 = 5;

/// Connects to Postgres with bounded exponential backoff: 1s base delay,
/// doubling per attempt, giving up after five attempts.
pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    let mut delay = Duration::from_secs(1);
    let mut attempt = 1;
    loop {
        match PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
        {
            Ok(pool) => {
                info!("connected to postgres");
                return Ok(pool);
            }
            Err(err) if attempt < MAX_CONNECT_ATTEMPTS => {
                warn!(
                    error = %err,
                    attempt,
                    retry_in_secs = delay.as_secs(),
                    "postgres connection failed, retrying"
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(err) => {
                return Err(err).context("connect to database");
            }
        }
    }
}
