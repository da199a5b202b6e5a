use thiserror::Error;

/// Raised by the analyzer when an `orderDate` cannot be read as a calendar date.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("could not parse order date `{value}` at record {index}: expected YYYY-MM-DD or an RFC 3339 timestamp")]
pub struct DateParseError {
    pub index: usize,
    pub value: String,
}

/// The only failure type that leaves the suggestion pipeline.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SuggestionError {
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
    #[error("no sales data available for `{product_name}` in this period")]
    NoSalesDataAvailable { product_name: String },
    #[error("reasoning engine unavailable: {message}")]
    ReasoningEngineUnavailable { message: String },
    #[error("reasoning engine output violated the response schema: {}", .violations.join("; "))]
    SchemaValidationError { violations: Vec<String> },
}

impl SuggestionError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "invalid_request",
            Self::NoSalesDataAvailable { .. } => "no_sales_data_available",
            Self::ReasoningEngineUnavailable { .. } => "reasoning_engine_unavailable",
            Self::SchemaValidationError { .. } => "schema_validation_error",
        }
    }

    /// Only transient engine failures are worth a caller-side retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ReasoningEngineUnavailable { .. })
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::NoSalesDataAvailable { .. } => {
                "No sales data in this period. Choose a wider date range to get a suggestion."
            }
            Self::ReasoningEngineUnavailable { .. } => {
                "The suggestion service is temporarily unavailable. Please retry shortly."
            }
            Self::SchemaValidationError { .. } => {
                "The suggestion service returned an unusable answer. Please try again later."
            }
        }
    }

    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let kind = self.kind();
        let retryable = self.is_retryable();
        let message = self.to_string();
        match self {
            Self::InvalidRequest { .. } => {
                InterfaceError::BadRequest { message, kind, retryable, correlation_id }
            }
            Self::NoSalesDataAvailable { .. } => {
                InterfaceError::InsufficientData { message, kind, retryable, correlation_id }
            }
            Self::ReasoningEngineUnavailable { .. } => {
                InterfaceError::ServiceUnavailable { message, kind, retryable, correlation_id }
            }
            Self::SchemaValidationError { .. } => {
                InterfaceError::BadGateway { message, kind, retryable, correlation_id }
            }
        }
    }
}

impl From<DateParseError> for SuggestionError {
    fn from(value: DateParseError) -> Self {
        Self::InvalidRequest { message: value.to_string() }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, kind: &'static str, retryable: bool, correlation_id: String },
    #[error("insufficient data: {message}")]
    InsufficientData {
        message: String,
        kind: &'static str,
        retryable: bool,
        correlation_id: String,
    },
    #[error("service unavailable: {message}")]
    ServiceUnavailable {
        message: String,
        kind: &'static str,
        retryable: bool,
        correlation_id: String,
    },
    #[error("bad gateway: {message}")]
    BadGateway { message: String, kind: &'static str, retryable: bool, correlation_id: String },
}

impl InterfaceError {
    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest { message, .. }
            | Self::InsufficientData { message, .. }
            | Self::ServiceUnavailable { message, .. }
            | Self::BadGateway { message, .. } => message,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest { kind, .. }
            | Self::InsufficientData { kind, .. }
            | Self::ServiceUnavailable { kind, .. }
            | Self::BadGateway { kind, .. } => kind,
        }
    }

    pub fn retryable(&self) -> bool {
        match self {
            Self::BadRequest { retryable, .. }
            | Self::InsufficientData { retryable, .. }
            | Self::ServiceUnavailable { retryable, .. }
            | Self::BadGateway { retryable, .. } => *retryable,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::InsufficientData { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::BadGateway { correlation_id, .. } => correlation_id,
        }
    }
}
