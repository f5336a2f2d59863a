use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Point-in-time gauges. Percentages are 0..=100, ping in milliseconds.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatsSnapshot {
    pub id: Uuid,
    pub cpu_usage: f64,
    pub ram_usage: f64,
    pub gpu_usage: f64,
    pub disk_usage: f64,
    pub temperature: f64,
    pub fps: f64,
    pub ping: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy)]
pub struct NewSnapshot {
    pub cpu_usage: f64,
    pub ram_usage: f64,
    pub gpu_usage: f64,
    pub disk_usage: f64,
    pub temperature: f64,
    pub fps: f64,
    pub ping: f64,
}
