//! Error Types for the Deskline API
//!
//! This module defines error handling for the API layer, including:
//! - ApiError struct for structured error responses
//! - ErrorCode enum for categorizing errors
//! - IntoResponse implementation for Axum HTTP responses
//!
//! Every error serializes into the uniform response envelope
//! `{code, msg, details?}` where `code` is a non-zero numeric status
//! (0 is reserved for success) and the HTTP status follows the error
//! family.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use deskline_core::{
    ConversationError, DesklineError, ScheduleError, StorageError, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each code maps to an HTTP status and a numeric envelope code.
/// `NoAgentAvailable` is deliberately a 503 so front ends can show
/// "no agent currently available" rather than "please retry".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Request validation failed
    ValidationFailed,

    /// Required field is missing from request
    MissingField,

    /// Field value is out of valid range
    InvalidRange,

    /// Field format is incorrect
    InvalidFormat,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// Requested entity does not exist
    EntityNotFound,

    /// Requested agent does not exist
    AgentNotFound,

    /// Requested shift template does not exist
    ShiftNotFound,

    /// Requested conversation does not exist
    ConversationNotFound,

    /// Requested leave/swap request does not exist
    RequestNotFound,

    /// Requested message category does not exist
    CategoryNotFound,

    // ========================================================================
    // Conflict Errors (409)
    // ========================================================================
    /// Entity with the same unique key already exists
    DuplicateEntity,

    /// Schedule assignment collides with existing entries
    ScheduleConflict,

    /// Concurrent modification detected (optimistic version mismatch)
    StaleVersion,

    /// Leave/swap request was already decided
    AlreadyDecided,

    /// Illegal conversation lifecycle transition
    StateViolation,

    /// Transfer target agent is not active and online
    AgentUnavailable,

    // ========================================================================
    // Availability Errors (503)
    // ========================================================================
    /// No agent is on duty right now
    NoAgentAvailable,

    // ========================================================================
    // Server Errors (500)
    // ========================================================================
    /// Internal server error
    InternalError,

    /// Storage operation failed
    StorageFailed,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationFailed
            | ErrorCode::MissingField
            | ErrorCode::InvalidRange
            | ErrorCode::InvalidFormat => StatusCode::BAD_REQUEST,

            ErrorCode::EntityNotFound
            | ErrorCode::AgentNotFound
            | ErrorCode::ShiftNotFound
            | ErrorCode::ConversationNotFound
            | ErrorCode::RequestNotFound
            | ErrorCode::CategoryNotFound => StatusCode::NOT_FOUND,

            ErrorCode::DuplicateEntity
            | ErrorCode::ScheduleConflict
            | ErrorCode::StaleVersion
            | ErrorCode::AlreadyDecided
            | ErrorCode::StateViolation
            | ErrorCode::AgentUnavailable => StatusCode::CONFLICT,

            ErrorCode::NoAgentAvailable => StatusCode::SERVICE_UNAVAILABLE,

            ErrorCode::InternalError | ErrorCode::StorageFailed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Numeric code carried in the response envelope (0 = success).
    pub fn wire_code(&self) -> i32 {
        match self {
            ErrorCode::ValidationFailed => 1000,
            ErrorCode::MissingField => 1001,
            ErrorCode::InvalidRange => 1002,
            ErrorCode::InvalidFormat => 1003,

            ErrorCode::EntityNotFound => 2000,
            ErrorCode::AgentNotFound => 2001,
            ErrorCode::ShiftNotFound => 2002,
            ErrorCode::ConversationNotFound => 2003,
            ErrorCode::RequestNotFound => 2004,
            ErrorCode::CategoryNotFound => 2005,

            ErrorCode::DuplicateEntity => 3000,
            ErrorCode::ScheduleConflict => 3001,
            ErrorCode::StaleVersion => 3002,
            ErrorCode::AlreadyDecided => 3003,
            ErrorCode::StateViolation => 3100,
            ErrorCode::AgentUnavailable => 3101,

            ErrorCode::NoAgentAvailable => 4000,

            ErrorCode::InternalError => 5000,
            ErrorCode::StorageFailed => 5001,
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "Request validation failed",
            ErrorCode::MissingField => "Required field is missing",
            ErrorCode::InvalidRange => "Value is out of valid range",
            ErrorCode::InvalidFormat => "Invalid format",

            ErrorCode::EntityNotFound => "Entity not found",
            ErrorCode::AgentNotFound => "Agent not found",
            ErrorCode::ShiftNotFound => "Shift template not found",
            ErrorCode::ConversationNotFound => "Conversation not found",
            ErrorCode::RequestNotFound => "Leave request not found",
            ErrorCode::CategoryNotFound => "Category not found",

            ErrorCode::DuplicateEntity => "Entity already exists",
            ErrorCode::ScheduleConflict => "Schedule conflict detected",
            ErrorCode::StaleVersion => "State changed, retry",
            ErrorCode::AlreadyDecided => "Request already decided",
            ErrorCode::StateViolation => "Illegal lifecycle transition",
            ErrorCode::AgentUnavailable => "Target agent is not available",

            ErrorCode::NoAgentAvailable => "No agent currently available",

            ErrorCode::InternalError => "Internal server error",
            ErrorCode::StorageFailed => "Storage operation failed",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response for API operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (conflicting agent ids, field errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
            details: None,
        }
    }

    /// Add additional details to the error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors
    // ========================================================================

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Required field '{}' is missing", field),
        )
    }

    pub fn invalid_range(field: &str, min: impl fmt::Display, max: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidRange,
            format!("Field '{}' must be between {} and {}", field, min, max),
        )
    }

    pub fn invalid_format(field: &str, expected: &str) -> Self {
        Self::new(
            ErrorCode::InvalidFormat,
            format!("Field '{}' has invalid format, expected {}", field, expected),
        )
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::EntityNotFound, message)
    }

    pub fn agent_not_found(agent_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::AgentNotFound,
            format!("Agent {} not found", agent_id),
        )
    }

    pub fn shift_not_found(shift_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::ShiftNotFound,
            format!("Shift template {} not found", shift_id),
        )
    }

    pub fn conversation_not_found(conversation_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::ConversationNotFound,
            format!("Conversation {} not found", conversation_id),
        )
    }

    pub fn request_not_found(request_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::RequestNotFound,
            format!("Leave request {} not found", request_id),
        )
    }

    pub fn category_not_found(category_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::CategoryNotFound,
            format!("Category {} not found", category_id),
        )
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// DOMAIN ERROR MAPPING
// ============================================================================

fn not_found_code(entity: &str) -> ErrorCode {
    match entity {
        "agent" => ErrorCode::AgentNotFound,
        "shift" => ErrorCode::ShiftNotFound,
        "conversation" => ErrorCode::ConversationNotFound,
        "leave request" => ErrorCode::RequestNotFound,
        "category" => ErrorCode::CategoryNotFound,
        _ => ErrorCode::EntityNotFound,
    }
}

impl From<DesklineError> for ApiError {
    fn from(err: DesklineError) -> Self {
        match err {
            DesklineError::Storage(storage) => match storage {
                StorageError::NotFound { entity, ref id } => ApiError::new(
                    not_found_code(entity),
                    format!("{} {} not found", entity, id),
                ),
                StorageError::DuplicateKey { .. } => {
                    ApiError::new(ErrorCode::DuplicateEntity, storage.to_string())
                }
                StorageError::StillReferenced { .. } => {
                    ApiError::new(ErrorCode::ScheduleConflict, storage.to_string())
                }
                other => ApiError::new(ErrorCode::StorageFailed, other.to_string()),
            },
            DesklineError::Validation(validation) => match validation {
                ValidationError::RequiredFieldMissing { ref field } => {
                    ApiError::missing_field(field)
                }
                ValidationError::OutOfRange { .. } => {
                    ApiError::new(ErrorCode::InvalidRange, validation.to_string())
                }
                other => ApiError::new(ErrorCode::ValidationFailed, other.to_string()),
            },
            DesklineError::Schedule(schedule) => match schedule {
                ScheduleError::Conflict {
                    ref agent_ids,
                    ..
                } => ApiError::new(ErrorCode::ScheduleConflict, schedule.to_string())
                    .with_details(serde_json::json!({ "agent_ids": agent_ids })),
                ScheduleError::AlreadyDecided { .. } => {
                    ApiError::new(ErrorCode::AlreadyDecided, schedule.to_string())
                }
                ScheduleError::SwapTargetBusy { .. } => {
                    ApiError::new(ErrorCode::ScheduleConflict, schedule.to_string())
                }
                ScheduleError::SwapTargetMissing | ScheduleError::SelfSwap => {
                    ApiError::new(ErrorCode::ValidationFailed, schedule.to_string())
                }
                ScheduleError::RangeTooLarge { .. } => {
                    ApiError::new(ErrorCode::InvalidRange, schedule.to_string())
                }
            },
            DesklineError::Conversation(conversation) => match conversation {
                ConversationError::IllegalTransition { .. } | ConversationError::Closed { .. } => {
                    ApiError::new(ErrorCode::StateViolation, conversation.to_string())
                }
                ConversationError::StaleVersion { .. } => {
                    ApiError::new(ErrorCode::StaleVersion, conversation.to_string())
                }
                ConversationError::NoAgentAvailable => {
                    ApiError::from_code(ErrorCode::NoAgentAvailable)
                }
                ConversationError::TargetUnavailable { .. } => {
                    ApiError::new(ErrorCode::AgentUnavailable, conversation.to_string())
                }
                ConversationError::SelfTransfer => {
                    ApiError::new(ErrorCode::ValidationFailed, conversation.to_string())
                }
            },
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        DesklineError::from(err).into()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        DesklineError::from(err).into()
    }
}

impl From<ScheduleError> for ApiError {
    fn from(err: ScheduleError) -> Self {
        DesklineError::from(err).into()
    }
}

impl From<ConversationError> for ApiError {
    fn from(err: ConversationError) -> Self {
        DesklineError::from(err).into()
    }
}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut body = serde_json::json!({
            "code": self.code.wire_code(),
            "msg": self.message,
        });
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (status, Json(body)).into_response()
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// TESTS
// =============================================================================
