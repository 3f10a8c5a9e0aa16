//! Process-level error type.
//!
//! Every failure that reaches `main` carries the exit code it should produce:
//!
//! - `2`: bad input, missing/corrupt artifacts, bad configuration (fatal at startup)
//! - `3`: a single request failed to encode (recoverable; one-shot commands exit with it)
//! - `4`: runtime failures (terminal, model numerics, output streams)

/// Input, artifact, or configuration problem.
pub const EXIT_INPUT: u8 = 2;
/// A prediction request was abandoned (encoding failure).
pub const EXIT_REQUEST: u8 = 3;
/// Terminal, numeric, or output failure while running.
pub const EXIT_RUNTIME: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(EXIT_INPUT, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(EXIT_RUNTIME, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
