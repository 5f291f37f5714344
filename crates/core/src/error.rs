use thiserror::Error;

/// Core error types for sol2js
#[derive(Debug, Error)]
pub enum Error {
    /// The native compiler could not be found or started
    #[error("{0}")]
    MissingToolchain(String),

    /// The compiler ran but reported a failure
    #[error("Compiler exited with {status}: {stderr}")]
    Compiler {
        status: String,
        stderr: String,
    },

    /// Filesystem read or write failure
    #[error("I/O error: {0}")]
    Io(String),

    /// Error when submitting to or reading from a chain
    #[error("Chain error: {0}")]
    Chain(String),

    /// Error when parsing compiler output or an ABI
    #[error("Failed to parse data: {0}")]
    Parse(String),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Template registration or rendering failure
    #[error("Template error: {0}")]
    Template(String),

    /// Error when validating data
    #[error("Data validation failed: {0}")]
    Validation(String),
}

impl Error {
    /// Create a new missing toolchain error
    pub fn missing_toolchain<S: Into<String>>(msg: S) -> Self {
        Error::MissingToolchain(msg.into())
    }

    /// Create a new compiler error
    pub fn compiler<S: Into<String>, T: Into<String>>(status: S, stderr: T) -> Self {
        Error::Compiler {
            status: status.into(),
            stderr: stderr.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(msg: S) -> Self {
        Error::Io(msg.into())
    }

    /// Create a new chain error
    pub fn chain<S: Into<String>>(msg: S) -> Self {
        Error::Chain(msg.into())
    }

    /// Create a new parse error
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Error::Parse(msg.into())
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create a new template error
    pub fn template<S: Into<String>>(msg: S) -> Self {
        Error::Template(msg.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Error::Validation(msg.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(format!("JSON parsing error: {}", err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
