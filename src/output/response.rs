//! Command results as one JSON document on stdout.
//!
//! Success: `{"success": true, "data": ...}`.
//! Failure: `{"success": false, "error": {"code", "message", "details", ...}}`.

use masquerade::error::Hint;
use masquerade::{Error, ErrorCode, Result};
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};

#[derive(Serialize)]
struct Envelope<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody<'a>>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'static str,
    message: &'a str,
    details: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    hints: Option<&'a [Hint]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retryable: Option<bool>,
}

impl<'a> Envelope<'a> {
    fn of(result: &'a Result<Value>) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(err) => Self {
                success: false,
                data: None,
                error: Some(ErrorBody {
                    code: err.code.as_str(),
                    message: &err.message,
                    details: &err.details,
                    hints: (!err.hints.is_empty()).then_some(err.hints.as_slice()),
                    retryable: err.retryable,
                }),
            },
        }
    }
}

/// Serialize a command's output and pick the process exit code.
///
/// Errors exit with their family's code; otherwise the command's own code is kept.
pub fn command_outcome<T: Serialize>(result: Result<(T, i32)>) -> (Result<Value>, i32) {
    let serialized = result.and_then(|(data, exit_code)| {
        serde_json::to_value(data)
            .map(|value| (value, exit_code))
            .map_err(|e| Error::internal_json(e.to_string(), Some("serialize output".to_string())))
    });

    match serialized {
        Ok((value, exit_code)) => (Ok(value), exit_code),
        Err(err) => {
            let exit_code = exit_code_for_error(err.code);
            (Err(err), exit_code)
        }
    }
}

fn exit_code_for_error(code: ErrorCode) -> i32 {
    match code {
        ErrorCode::ConfigInvalidValue
        | ErrorCode::ValidationMissingArgument
        | ErrorCode::ValidationInvalidArgument => 2,

        ErrorCode::NamingCorpusExhausted => 3,

        ErrorCode::SourceParseFailed => 4,

        ErrorCode::RefactorEngineFailed
        | ErrorCode::RefactorEngineTimeout
        | ErrorCode::RefactorTransactionFailed => 20,

        ErrorCode::InternalIoError
        | ErrorCode::InternalJsonError
        | ErrorCode::InternalUnexpected => 1,
    }
}

/// Write the envelope for `result` to stdout. A closed pipe is not an error.
pub fn print_json_result(result: Result<Value>) -> Result<()> {
    let payload = serde_json::to_string_pretty(&Envelope::of(&result))
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize envelope".to_string())))?;

    match writeln!(io::stdout().lock(), "{}", payload) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        Err(e) => Err(Error::internal_io(e.to_string(), Some("write stdout".to_string()))),
    }
}
