use serde::Deserialize;

use super::repo_types::NewSnapshot;
use crate::{error::ApiError, validation::Validate};

pub const DEFAULT_HISTORY_LIMIT: i64 = 50;
pub const MAX_HISTORY_LIMIT: i64 = 500;

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

impl HistoryQuery {
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordStatsRequest {
    pub cpu_usage: f64,
    pub ram_usage: f64,
    pub gpu_usage: f64,
    pub disk_usage: f64,
    pub temperature: f64,
    pub fps: f64,
    pub ping: f64,
}

fn check_percent(field: &str, value: f64) -> Result<(), ApiError> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(ApiError::validation(format!(
            "{field} must be between 0 and 100"
        )));
    }
    Ok(())
}

fn check_non_negative(field: &str, value: f64) -> Result<(), ApiError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ApiError::validation(format!("{field} must be non-negative")));
    }
    Ok(())
}

impl Validate for RecordStatsRequest {
    fn validate(&self) -> Result<(), ApiError> {
        check_percent("cpuUsage", self.cpu_usage)?;
        check_percent("ramUsage", self.ram_usage)?;
        check_percent("gpuUsage", self.gpu_usage)?;
        check_percent("diskUsage", self.disk_usage)?;
        if !self.temperature.is_finite() {
            return Err(ApiError::validation("temperature must be a number"));
        }
        check_non_negative("fps", self.fps)?;
        check_non_negative("ping", self.ping)
    }
}

impl From<RecordStatsRequest> for NewSnapshot {
    fn from(r: RecordStatsRequest) -> Self {
        NewSnapshot {
            cpu_usage: r.cpu_usage,
            ram_usage: r.ram_usage,
            gpu_usage: r.gpu_usage,
            disk_usage: r.disk_usage,
            temperature: r.temperature,
            fps: r.fps,
            ping: r.ping,
        }
    }
}
