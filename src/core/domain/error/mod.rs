use thiserror::Error;

/// The main error type for Proxmox HA operations.
///
/// This enum represents all possible errors that can occur while polling
/// HA resource state or writing state changes back to the cluster,
/// including connection, authentication and validation failures.
#[derive(Error, Debug)]
pub enum ProxmoxError {
    /// Represents errors that occur while talking to the Proxmox API
    ///
    /// # Fields
    /// * `0` - A description of what went wrong during the request
    #[error("Connection error: {0}")]
    Connection(String),

    /// Represents authentication failures
    ///
    /// # Fields
    /// * `0` - A description of the authentication failure
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Represents validation failures with detailed context
    ///
    /// # Fields
    /// * `source` - The underlying validation error
    #[error("Validation error: {source}")]
    Validation {
        #[from]
        source: ValidationError,
    },

    /// A user-facing failure of an entity action.
    ///
    /// The message identifies the resource and the attempted value; the
    /// lower-level cause is kept as the error source for diagnostics only.
    ///
    /// # Fields
    /// * `message` - Description including the resource identifier and value
    /// * `source` - The underlying failure, if any
    #[error("Action failed: {message}")]
    Action {
        message: String,
        #[source]
        source: Option<Box<ProxmoxError>>,
    },
}

/// Specialized error type for validation failures.
///
/// This enum provides detailed context about why a validation
/// failed, including field-specific errors and format violations.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Represents a validation failure for a specific field
    ///
    /// # Fields
    /// * `field` - The name of the field that failed validation
    /// * `message` - A detailed message about why validation failed
    #[error("Field '{field}' validation failed: {message}")]
    Field { field: String, message: String },

    /// Represents format/syntax validation failures
    ///
    /// # Fields
    /// * `0` - Description of the format violation
    #[error("Format error: {0}")]
    Format(String),
}

/// Type alias for Results that may fail with a ProxmoxError
pub type ProxmoxResult<T> = Result<T, ProxmoxError>;
