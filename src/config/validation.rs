//! Configuration validation.
//!
//! Serde handles syntax; this module checks values. All errors are collected
//! rather than stopping at the first one.

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.auth.api_key.trim().is_empty() {
        errors.push(ValidationError::new(
            "auth.api_key",
            "must be set (config file or API_KEY environment variable)",
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::new("limits.max_body_bytes", "must be greater than 0"));
    }

    let rl = &config.rate_limit;
    if rl.enabled {
        if !rl.refill_rate.is_finite() || rl.refill_rate <= 0.0 {
            errors.push(ValidationError::new(
                "rate_limit.refill_rate",
                "must be a positive number",
            ));
        }
        if rl.burst_capacity == 0 {
            errors.push(ValidationError::new(
                "rate_limit.burst_capacity",
                "must be at least 1",
            ));
        }
        if rl.sweep_interval_secs == 0 {
            errors.push(ValidationError::new(
                "rate_limit.sweep_interval_secs",
                "must be greater than 0",
            ));
        }
        // An evicted bucket must already have been full, otherwise eviction
        // would hand a throttled client a fresh burst.
        if rl.refill_rate > 0.0 {
            let time_to_full = rl.burst_capacity as f64 / rl.refill_rate;
            if (rl.idle_ttl_secs as f64) < time_to_full {
                errors.push(ValidationError::new(
                    "rate_limit.idle_ttl_secs",
                    format!(
                        "must be at least {:.0}s (burst_capacity / refill_rate)",
                        time_to_full.ceil()
                    ),
                ));
            }
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
