//! System settings
//!
//! Key/value rows in the `settings` table, read and written through a typed
//! `SystemSettings` view. Missing or unparsable values fall back to the defaults.

use relato_common::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

pub const INSTITUTION_NAME: &str = "institution_name";
pub const PERSONNEL_SCORE: &str = "personnel_score";
pub const FLEET_SCORE: &str = "fleet_score";
pub const SUPPLY_SCORE: &str = "supply_score";
pub const LIGHT_PROTOCOL: &str = "light_protocol";
pub const AI_TRIAGE: &str = "ai_triage";
pub const EMAIL_NOTIFICATIONS: &str = "email_notifications";

/// Commander-editable system settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSettings {
    pub institution_name: String,
    pub personnel_score: f64,
    pub fleet_score: f64,
    pub supply_score: f64,
    pub light_protocol: bool,
    pub ai_triage: bool,
    pub email_notifications: bool,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            institution_name: "8º Regimento de Cavalaria Mecanizado".to_string(),
            personnel_score: 94.2,
            fleet_score: 82.5,
            supply_score: 89.8,
            light_protocol: true,
            ai_triage: true,
            email_notifications: true,
        }
    }
}

/// Partial settings update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub institution_name: Option<String>,
    pub personnel_score: Option<f64>,
    pub fleet_score: Option<f64>,
    pub supply_score: Option<f64>,
    pub light_protocol: Option<bool>,
    pub ai_triage: Option<bool>,
    pub email_notifications: Option<bool>,
}

/// Read all system settings
pub async fn load_settings(pool: &SqlitePool) -> Result<SystemSettings> {
    let defaults = SystemSettings::default();

    Ok(SystemSettings {
        institution_name: get_setting(pool, INSTITUTION_NAME)
            .await?
            .unwrap_or(defaults.institution_name),
        personnel_score: get_or(pool, PERSONNEL_SCORE, defaults.personnel_score).await?,
        fleet_score: get_or(pool, FLEET_SCORE, defaults.fleet_score).await?,
        supply_score: get_or(pool, SUPPLY_SCORE, defaults.supply_score).await?,
        light_protocol: get_or(pool, LIGHT_PROTOCOL, defaults.light_protocol).await?,
        ai_triage: get_or(pool, AI_TRIAGE, defaults.ai_triage).await?,
        email_notifications: get_or(pool, EMAIL_NOTIFICATIONS, defaults.email_notifications)
            .await?,
    })
}

/// Apply a partial update and return the resulting settings
pub async fn update_settings(pool: &SqlitePool, update: SettingsUpdate) -> Result<SystemSettings> {
    if let Some(name) = update.institution_name {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("institutionName must not be empty".into()));
        }
        set_setting(pool, INSTITUTION_NAME, name).await?;
    }
    if let Some(v) = update.personnel_score {
        set_setting(pool, PERSONNEL_SCORE, v).await?;
    }
    if let Some(v) = update.fleet_score {
        set_setting(pool, FLEET_SCORE, v).await?;
    }
    if let Some(v) = update.supply_score {
        set_setting(pool, SUPPLY_SCORE, v).await?;
    }
    if let Some(v) = update.light_protocol {
        set_setting(pool, LIGHT_PROTOCOL, v).await?;
    }
    if let Some(v) = update.ai_triage {
        set_setting(pool, AI_TRIAGE, v).await?;
    }
    if let Some(v) = update.email_notifications {
        set_setting(pool, EMAIL_NOTIFICATIONS, v).await?;
    }

    load_settings(pool).await
}

/// Whether report submission should run the triage engine
pub async fn ai_triage_enabled(pool: &SqlitePool) -> Result<bool> {
    get_or(pool, AI_TRIAGE, true).await
}

async fn get_or<T>(pool: &SqlitePool, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
{
    let raw: Option<String> = get_setting(pool, key).await?;
    Ok(raw.and_then(|v| v.parse().ok()).unwrap_or(default))
}

/// Generic setting getter; `None` when the key is absent or NULL
pub async fn get_setting<T>(pool: &SqlitePool, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let value: Option<Option<String>> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    match value.flatten() {
        Some(value) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting '{}' failed: {}", key, e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Generic setting setter (upsert)
pub async fn set_setting<T>(pool: &SqlitePool, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(pool)
    .await?;

    Ok(())
}
