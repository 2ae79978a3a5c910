use log::warn;
use sqlx::SqliteConnection;

use crate::traits::MarketplaceError;

/// 5%, the platform default when the setting row has gone missing.
pub const DEFAULT_COMMISSION_BPS: i64 = 500;

pub async fn get_setting(name: &str, conn: &mut SqliteConnection) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT value FROM settings WHERE name = $1").bind(name).fetch_optional(conn).await?;
    Ok(row.map(|(v,)| v))
}

pub async fn set_setting(name: &str, value: &str, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO settings (name, value) VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET value = excluded.value;
        "#,
    )
    .bind(name)
    .bind(value)
    .execute(conn)
    .await?;
    Ok(())
}

/// The live platform commission in basis points. Read fresh on every cost calculation; never
/// cached anywhere in the engine.
pub async fn commission_bps(conn: &mut SqliteConnection) -> Result<i64, MarketplaceError> {
    let value = get_setting("commission_bps", conn).await?;
    let bps = match value {
        Some(v) => v.parse::<i64>().unwrap_or_else(|_| {
            warn!("⚙️ commission_bps setting '{v}' is not a number. Falling back to {DEFAULT_COMMISSION_BPS}");
            DEFAULT_COMMISSION_BPS
        }),
        None => {
            warn!("⚙️ commission_bps setting is missing. Falling back to {DEFAULT_COMMISSION_BPS}");
            DEFAULT_COMMISSION_BPS
        },
    };
    Ok(bps)
}

pub async fn set_commission_bps(bps: i64, conn: &mut SqliteConnection) -> Result<(), MarketplaceError> {
    set_setting("commission_bps", &bps.to_string(), conn).await?;
    Ok(())
}
