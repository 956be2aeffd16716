//! Error types for the grants engine

use thiserror::Error;

/// Grants model errors
///
/// A single domain error kind; the formatted message is the stable contract
/// for callers. Variants follow the failure taxonomy: structural, naming,
/// unknown action/possession, hierarchy, lock.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    /// Raw grants input is not an object or a list of access records
    #[error("Invalid grants object. {0}")]
    InvalidGrants(String),

    /// Empty or non-string name
    #[error("Invalid name, expected a valid string.")]
    InvalidName,

    /// Use of a reserved keyword as a role or resource name
    #[error("Cannot use reserved name: \"{0}\"")]
    ReservedName(String),

    /// Action not in the canonical set
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Possession not in {own, any}
    #[error("Invalid action possession: {0}")]
    InvalidPossession(String),

    /// Missing or malformed role name(s)
    #[error("Invalid role(s): {0}")]
    InvalidRole(String),

    /// Missing or malformed resource name(s)
    #[error("Invalid resource(s): {0}")]
    InvalidResource(String),

    /// Attribute list is neither empty nor a list of non-empty strings
    #[error("Invalid resource attributes for action \"{0}\".")]
    InvalidAttributes(String),

    /// Referenced role is absent from the model
    #[error("Role not found: \"{0}\"")]
    RoleNotFound(String),

    /// A role's extension list names the role itself
    #[error("Cannot extend role \"{0}\" by itself.")]
    SelfExtension(String),

    /// Two roles would extend each other, directly or transitively
    #[error("Cross inheritance is not allowed. Role \"{role}\" already extends \"{other}\".")]
    CrossInheritance {
        /// The role whose hierarchy already contains `other`
        role: String,
        /// The role that was about to be extended
        other: String,
    },

    /// Mutating call made after lock
    #[error("Cannot alter the underlying grants model. The instance is locked.")]
    Locked,

    /// Attempt to lock a model with zero roles
    #[error("Cannot lock empty or invalid grants model.")]
    EmptyModel,
}

/// Result type for grants operations
pub type Result<T> = std::result::Result<T, ModelError>;
