//! INI loading for transport builders.
//!
//! Reads one section with the keys `name`, `level`, `amqp_url`, `exchange`,
//! `durable`, `auto_delete` and `routing_key`. Every key is optional; absent
//! keys keep the builder defaults. Connections and connectors cannot be
//! expressed in a file and must be attached to the returned builder.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::Path;

use ini::{Ini, Properties};
use thiserror::Error;

use crate::amqp_transport::ExchangeOptions;
use crate::handlers::AmqpTransportBuilder;

#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("{path} doesn't exist")]
    NotFound { path: String },
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse ini: {0}")]
    Parse(#[from] ini::ParseError),
    #[error("section [{0}] not found")]
    MissingSection(String),
    #[error("invalid value '{value}' for key '{key}'")]
    InvalidValue { key: String, value: String },
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigFileError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigFileError::InvalidValue {
            key: key.to_owned(),
            value: value.to_owned(),
        }),
    }
}

fn apply_exchange_options(props: &Properties) -> Result<Option<ExchangeOptions>, ConfigFileError> {
    let durable = props.get("durable").map(|v| parse_bool("durable", v)).transpose()?;
    let auto_delete = props
        .get("auto_delete")
        .map(|v| parse_bool("auto_delete", v))
        .transpose()?;
    if durable.is_none() && auto_delete.is_none() {
        return Ok(None);
    }
    let defaults = ExchangeOptions::default();
    Ok(Some(ExchangeOptions {
        durable: durable.unwrap_or(defaults.durable),
        auto_delete: auto_delete.unwrap_or(defaults.auto_delete),
    }))
}

/// Build a transport builder from `section` of the INI document `text`.
pub fn builder_from_ini_str(text: &str, section: &str) -> Result<AmqpTransportBuilder, ConfigFileError> {
    let ini = Ini::load_from_str(text)?;
    let props = ini
        .section(Some(section))
        .ok_or_else(|| ConfigFileError::MissingSection(section.to_owned()))?;

    let mut builder = AmqpTransportBuilder::new();
    if let Some(name) = props.get("name") {
        builder = builder.with_name(name);
    }
    if let Some(level) = props.get("level") {
        builder = builder.with_level(level);
    }
    if let Some(url) = props.get("amqp_url") {
        builder = builder.with_url(url);
    }
    if let Some(exchange) = props.get("exchange") {
        builder = builder.with_exchange(exchange);
    }
    if let Some(options) = apply_exchange_options(props)? {
        builder = builder.with_exchange_options(options);
    }
    if let Some(routing_key) = props.get("routing_key") {
        builder = builder.with_routing_key(routing_key);
    }
    Ok(builder)
}

/// Read `path` and build a transport builder from `section`.
pub fn builder_from_ini_file(
    path: impl AsRef<Path>,
    section: &str,
) -> Result<AmqpTransportBuilder, ConfigFileError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => ConfigFileError::NotFound {
            path: path.display().to_string(),
        },
        _ => ConfigFileError::Io {
            path: path.display().to_string(),
            source: err,
        },
    })?;
    builder_from_ini_str(&text, section)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SAMPLE: &str = "\
[transport_amqp]
name = audit
level = warn
amqp_url = amqp://broker:5672
exchange = audit-logs
durable = yes
routing_key = audit
";

    #[rstest]
    fn reads_all_keys() {
        let builder = builder_from_ini_str(SAMPLE, "transport_amqp").expect("parse");
        let rendered = format!("{builder:?}");
        assert!(rendered.contains("\"audit\""));
        assert!(rendered.contains("\"warn\""));
        assert!(rendered.contains("amqp://broker:5672"));
        assert!(rendered.contains("\"audit-logs\""));
        assert!(rendered.contains("durable: true, auto_delete: true"));
    }

    #[rstest]
    fn missing_section_is_reported() {
        let err = builder_from_ini_str(SAMPLE, "other").expect_err("no such section");
        assert!(matches!(err, ConfigFileError::MissingSection(name) if name == "other"));
    }

    #[rstest]
    #[case("durable = maybe")]
    #[case("auto_delete = 2")]
    fn rejects_bad_booleans(#[case] line: &str) {
        let text = format!("[t]\n{line}\n");
        let err = builder_from_ini_str(&text, "t").expect_err("bad bool");
        assert!(matches!(err, ConfigFileError::InvalidValue { .. }));
    }

    #[rstest]
    fn missing_file_is_reported() {
        let err = builder_from_ini_file("/definitely/not/here.ini", "t").expect_err("missing");
        assert!(matches!(err, ConfigFileError::NotFound { .. }));
    }
}
