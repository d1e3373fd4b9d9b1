//! Configuration validation.
//!
//! Checks every config section before the store or server is built.

use crate::domain::error::PlotterError;
use crate::domain::projection::MAX_DURATION_YEARS;
use crate::ports::config_port::ConfigPort;
use std::net::SocketAddr;

/// Largest integer any count-like key accepts; every such value must fit a `u32`.
const MAX_COUNT: i64 = u32::MAX as i64;

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), PlotterError> {
    validate_processed_dir(config)?;
    validate_int_range(config, "data", "page_size", 1, MAX_COUNT)?;
    validate_int_range(config, "data", "read_timeout_ms", 1, MAX_COUNT)?;
    Ok(())
}

pub fn validate_server_config(config: &dyn ConfigPort) -> Result<(), PlotterError> {
    validate_listen(config)?;
    validate_allowed_origins(config)?;
    Ok(())
}

pub fn validate_projection_config(config: &dyn ConfigPort) -> Result<(), PlotterError> {
    validate_allowed_durations(config)?;
    validate_int_range(config, "projection", "months_per_year", 1, MAX_COUNT)?;
    validate_int_range(config, "projection", "history_padding_months", 0, MAX_COUNT)?;
    validate_int_range(config, "projection", "default_history_months", 1, MAX_COUNT)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> PlotterError {
    PlotterError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_processed_dir(config: &dyn ConfigPort) -> Result<(), PlotterError> {
    match config.get_string("data", "processed_dir") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(PlotterError::ConfigMissing {
            section: "data".to_string(),
            key: "processed_dir".to_string(),
        }),
    }
}

/// A key that may be absent, but when present must be an integer in
/// `min..=max`.
fn validate_int_range(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    min: i64,
    max: i64,
) -> Result<(), PlotterError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(());
    };
    match raw.trim().parse::<i64>() {
        Ok(v) if (min..=max).contains(&v) => Ok(()),
        _ => Err(invalid(
            section,
            key,
            format!("{key} must be an integer between {min} and {max}"),
        )),
    }
}

fn validate_listen(config: &dyn ConfigPort) -> Result<(), PlotterError> {
    if let Some(listen) = config.get_string("server", "listen") {
        listen
            .trim()
            .parse::<SocketAddr>()
            .map_err(|_| invalid("server", "listen", "expected host:port, e.g. 127.0.0.1:3000"))?;
    }
    Ok(())
}

fn validate_allowed_origins(config: &dyn ConfigPort) -> Result<(), PlotterError> {
    for origin in config.get_list("server", "allowed_origins").unwrap_or_default() {
        if !(origin.starts_with("http://") || origin.starts_with("https://")) {
            return Err(invalid(
                "server",
                "allowed_origins",
                format!("origin {origin:?} must start with http:// or https://"),
            ));
        }
    }
    Ok(())
}

fn validate_allowed_durations(config: &dyn ConfigPort) -> Result<(), PlotterError> {
    let Some(items) = config.get_list("projection", "allowed_durations") else {
        return Ok(());
    };
    if items.is_empty() {
        return Err(invalid(
            "projection",
            "allowed_durations",
            "at least one duration is required",
        ));
    }
    for item in items {
        match item.parse::<u32>() {
            Ok(v) if (1..=MAX_DURATION_YEARS).contains(&v) => {}
            _ => {
                return Err(invalid(
                    "projection",
                    "allowed_durations",
                    format!("{item:?} is not a number of years between 1 and {MAX_DURATION_YEARS}"),
                ));
            }
        }
    }
    Ok(())
}
