//! JSON output for CLI
//!
//! Every command prints exactly one JSON object on stdout:
//! `{"status":"ok","data":…}` or
//! `{"status":"error","code":…,"message":…[,"details":…]}`.
//! Logs go to stderr.

use std::io::{self, Write};

use serde_json::Value;

use super::errors::CliResult;

fn write_value(response: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, response)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

pub fn write_response(data: Value) -> CliResult<()> {
    write_value(&serde_json::json!({
        "status": "ok",
        "data": data
    }))
}

pub fn write_error(code: &str, message: &str, details: Option<&Value>) -> CliResult<()> {
    let mut response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });
    if let Some(details) = details {
        response["details"] = details.clone();
    }
    write_value(&response)
}
