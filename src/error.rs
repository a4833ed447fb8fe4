//! Error types for obsweave.

/// Result type alias for obsweave operations.
pub type Result<T> = std::result::Result<T, ObserveError>;

/// Errors that can occur while building watch trees or composing change streams.
///
/// Every variant is raised synchronously while a tree or stream is being built.
/// Once a [`ChangeStream`](crate::notify::ChangeStream) exists, nothing in this
/// crate produces errors for the events flowing through it.
#[derive(Debug, thiserror::Error)]
pub enum ObserveError {
    /// A dedent asked for an ancestor above the root of the tree.
    #[error("Line {line} ('{name}') dedents {steps} level(s) past the root of the watch tree")]
    Structural {
        /// 1-based line number in the watch text
        line: usize,
        /// The node name carried by the offending line
        name: String,
        /// Number of ascents requested by the dedent
        steps: usize,
    },

    /// Per-field composition was requested without any fields to compose.
    #[error("Invalid watch configuration: {0}")]
    Config(String),

    /// A configured field does not exist on the object being visited.
    #[error("The `{field}` property does not exist on `{model}`")]
    Resolution {
        /// Model name of the visited object
        model: String,
        /// Field name that failed to resolve
        field: String,
    },

    /// A line separator or indent unit was empty.
    #[error("Invalid delimiter: {0} must not be empty")]
    InvalidDelimiter(&'static str),

    /// A list position outside the current bounds was requested.
    #[error("Index {index} is out of bounds for a list of length {len}")]
    IndexOutOfBounds {
        /// Requested position
        index: usize,
        /// Length of the list at the time of the request
        len: usize,
    },

    /// A value could not be converted into its JSON snapshot.
    #[error("Failed to snapshot value: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Composer settings could not be loaded.
    #[error("Failed to load settings: {0}")]
    Settings(String),

    /// A named watch is not defined in the settings.
    #[error("Unknown watch: {0}")]
    UnknownWatch(String),
}

impl ObserveError {
    /// Create a resolution error for `field` on `model`.
    pub fn resolution(model: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Resolution {
            model: model.into(),
            field: field.into(),
        }
    }

    /// Returns true when the error was raised while parsing watch text.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Structural { .. } | Self::InvalidDelimiter(_))
    }
}

impl From<config::ConfigError> for ObserveError {
    fn from(err: config::ConfigError) -> Self {
        ObserveError::Settings(err.to_string())
    }
}
