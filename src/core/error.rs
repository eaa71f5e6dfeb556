use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigInvalidValue,

    ValidationMissingArgument,
    ValidationInvalidArgument,

    SourceParseFailed,

    NamingCorpusExhausted,

    RefactorEngineFailed,
    RefactorEngineTimeout,
    RefactorTransactionFailed,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationMissingArgument => "validation.missing_argument",
            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::SourceParseFailed => "source.parse_failed",

            ErrorCode::NamingCorpusExhausted => "naming.corpus_exhausted",

            ErrorCode::RefactorEngineFailed => "refactor.engine_failed",
            ErrorCode::RefactorEngineTimeout => "refactor.engine_timeout",
            ErrorCode::RefactorTransactionFailed => "refactor.transaction_failed",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingArgumentDetails {
    pub args: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tried: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceParseFailedDetails {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusExhaustedDetails {
    pub names: usize,
    pub attempts: u32,
    pub capacity: u128,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineFailedDetails {
    pub file: String,
    pub declaration: String,
    pub new_name: String,
    pub engine_message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineTimeoutDetails {
    pub file: String,
    pub declaration: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFailedDetails {
    pub file: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalJsonErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
    pub retryable: Option<bool>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
            retryable: None,
        }
    }

    pub fn validation_missing_argument(args: Vec<String>) -> Self {
        Self::new(
            ErrorCode::ValidationMissingArgument,
            "Missing required argument",
            to_details(MissingArgumentDetails { args }),
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        id: Option<String>,
        tried: Option<Vec<String>>,
    ) -> Self {
        let details = to_details(InvalidArgumentDetails {
            field: field.into(),
            problem: problem.into(),
            id,
            tried,
        });

        Self::new(
            ErrorCode::ValidationInvalidArgument,
            "Invalid argument",
            details,
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        let details = to_details(ConfigInvalidValueDetails {
            key: key.into(),
            value,
            problem: problem.into(),
        });

        Self::new(
            ErrorCode::ConfigInvalidValue,
            "Invalid configuration value",
            details,
        )
    }

    pub fn source_parse_failed(
        file: impl Into<String>,
        line: usize,
        column: usize,
        problem: impl Into<String>,
    ) -> Self {
        let file = file.into();
        let problem = problem.into();
        let message = format!("{}:{}:{}: {}", file, line, column, problem);
        let details = to_details(SourceParseFailedDetails {
            file,
            line,
            column,
            problem,
        });

        Self::new(ErrorCode::SourceParseFailed, message, details)
    }

    pub fn corpus_exhausted(names: usize, attempts: u32, capacity: u128) -> Self {
        let details = to_details(CorpusExhaustedDetails {
            names,
            attempts,
            capacity,
        });

        Self::new(
            ErrorCode::NamingCorpusExhausted,
            format!(
                "Could not derive {} distinct names within {} attempts",
                names, attempts
            ),
            details,
        )
        .with_hint("Use a larger corpus (corpusFile) or raise maxAttempts")
    }

    pub fn engine_failed(
        file: impl Into<String>,
        declaration: impl Into<String>,
        new_name: impl Into<String>,
        engine_message: impl Into<String>,
    ) -> Self {
        let file = file.into();
        let declaration = declaration.into();
        let message = format!("Refactor engine failed to rename '{}' in {}", declaration, file);
        let details = to_details(EngineFailedDetails {
            file,
            declaration,
            new_name: new_name.into(),
            engine_message: engine_message.into(),
        });

        Self::new(ErrorCode::RefactorEngineFailed, message, details)
    }

    pub fn engine_timeout(
        file: impl Into<String>,
        declaration: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        let file = file.into();
        let declaration = declaration.into();
        let message = format!(
            "Refactor engine did not answer within {}s while renaming '{}' in {}",
            timeout_secs, declaration, file
        );
        let details = to_details(EngineTimeoutDetails {
            file,
            declaration,
            timeout_secs,
        });

        let mut err = Self::new(ErrorCode::RefactorEngineTimeout, message, details)
            .with_hint("Raise engineTimeoutSecs or pass --timeout");
        err.retryable = Some(true);
        err
    }

    pub fn transaction_failed(file: impl Into<String>, error: impl Into<String>) -> Self {
        let details = to_details(TransactionFailedDetails {
            file: file.into(),
            error: error.into(),
        });

        Self::new(
            ErrorCode::RefactorTransactionFailed,
            "Failed to apply source change",
            details,
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        let details = to_details(InternalIoErrorDetails {
            error: error.into(),
            context,
        });

        Self::new(ErrorCode::InternalIoError, "IO error", details)
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        let details = to_details(InternalJsonErrorDetails {
            error: error.into(),
            context,
        });

        Self::new(ErrorCode::InternalJsonError, "JSON error", details)
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }

    /// Attach an extra field to the details object.
    pub fn with_detail(mut self, key: &str, value: Value) -> Self {
        if let Value::Object(map) = &mut self.details {
            map.insert(key.to_string(), value);
        }
        self
    }
}
