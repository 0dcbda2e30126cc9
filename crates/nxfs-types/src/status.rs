use std::fmt;

use crate::status_code::{self, status_code_t, FsCode};

/// A status value carrying a numeric code and an optional message.
///
/// The `#[must_use]` attribute ensures callers do not silently ignore
/// error statuses.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Status {
    code: status_code_t,
    message: Option<String>,
}

impl Status {
    /// Create a status with just a code.
    pub fn new(code: status_code_t) -> Self {
        Self {
            code,
            message: None,
        }
    }

    /// Create a status with a code and a descriptive message.
    pub fn with_message(code: status_code_t, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(msg.into()),
        }
    }

    /// Return the numeric status code.
    pub fn code(&self) -> status_code_t {
        self.code
    }

    /// Return the optional message.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Whether this status represents success.
    pub fn is_ok(&self) -> bool {
        self.code == FsCode::SUCCESS
    }

    /// Produce a human-readable description like `"TooLongPath(0x2EE602)"`.
    pub fn describe(&self) -> String {
        let name = status_code::to_string(self.code);
        match &self.message {
            Some(msg) => format!("{}(0x{:06X}) {}", name, self.code, msg),
            None => format!("{}(0x{:06X})", name, self.code),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl std::error::Error for Status {}

impl From<status_code_t> for Status {
    fn from(code: status_code_t) -> Self {
        Self::new(code)
    }
}
