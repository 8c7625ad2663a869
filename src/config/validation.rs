//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check plugin descriptors (unique names, non-empty factory ids)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::ServerConfig;
use crate::services::HTTP2_REALM;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::new("listener.max_connections", "must be greater than 0"));
    }
    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.is_empty() || tls.key_path.is_empty() {
            errors.push(ValidationError::new(
                "listener.tls",
                "cert_path and key_path are required",
            ));
        }
    }

    let index = &config.paths.index_name;
    if index.is_empty() || index.contains('/') {
        errors.push(ValidationError::new("paths.index_name", "must be a plain file name"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    let mut names = HashSet::new();
    for (i, plugin) in config.plugins.iter().enumerate() {
        if plugin.name.is_empty() {
            errors.push(ValidationError::new(format!("plugins[{i}].name"), "must not be empty"));
        } else if plugin.name == HTTP2_REALM {
            errors.push(ValidationError::new(
                format!("plugins[{i}].name"),
                format!("'{HTTP2_REALM}' is reserved for the built-in plugin"),
            ));
        } else if !names.insert(plugin.name.as_str()) {
            errors.push(ValidationError::new(
                format!("plugins[{i}].name"),
                format!("duplicate plugin '{}'", plugin.name),
            ));
        }
        if !plugin.services.is_empty() && plugin.realm.is_none() {
            errors.push(ValidationError::new(
                format!("plugins[{i}].realm"),
                "services are declared without a realm",
            ));
        }
        for (j, handler) in plugin.handlers.iter().enumerate() {
            if handler.factory_id.is_empty() {
                errors.push(ValidationError::new(
                    format!("plugins[{i}].handlers[{j}].factory_id"),
                    "must not be empty",
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
