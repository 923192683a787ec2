//! JSON I/O handling for the CLI
//!
//! - Input: one JSON object on stdin
//! - Output: one JSON object on stdout
//! - Logs go to stderr, never stdout

use std::io::{self, Read, Write};

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Reads one JSON request from stdin.
pub fn read_request<T: DeserializeOwned>() -> CliResult<T> {
    let mut input = String::new();
    io::stdin().lock().read_to_string(&mut input)?;
    parse_request(&input)
}

/// Parses a request body.
pub fn parse_request<T: DeserializeOwned>(input: &str) -> CliResult<T> {
    if input.trim().is_empty() {
        return Err(CliError::io_error("Empty input"));
    }
    Ok(serde_json::from_str(input)?)
}

/// Writes a success response to stdout.
pub fn write_response(data: Value) -> CliResult<()> {
    write_value(&serde_json::json!({
        "status": "ok",
        "data": data
    }))
}

/// Writes an error response to stdout.
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    write_value(&serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    }))
}

fn write_value(value: &Value) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::EntityQuery;

    #[test]
    fn test_parse_request() {
        let query: EntityQuery =
            parse_request("{\n  \"entity_type\": \"node\",\n  \"count\": true\n}").unwrap();
        assert_eq!(query.entity_type(), "node");
        assert!(query.is_count());

        let err = parse_request::<EntityQuery>("   ").unwrap_err();
        assert_eq!(err.code(), "CLI_IO_ERROR");

        let err = parse_request::<EntityQuery>("{\"count\": true}").unwrap_err();
        assert_eq!(err.code(), "CLI_IO_ERROR");
    }
}
