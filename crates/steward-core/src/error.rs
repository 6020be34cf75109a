//! Error types for scanning, binding, and dispatch

use crate::types::ManagedType;

/// Result type for dispatch requests
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Errors returned to the immediate caller of a dispatch request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DispatchError {
    /// No attribute with this name exists in the descriptor
    #[error("Attribute not found: {0}")]
    AttributeNotFound(String),

    /// The attribute exists but has no readable side
    #[error("Attribute not readable: {0}")]
    AttributeNotReadable(String),

    /// The attribute exists but has no writable side
    #[error("Attribute not writable: {0}")]
    AttributeNotWritable(String),

    /// A signature entry names a type that cannot be resolved
    #[error("Cannot resolve type '{type_name}'")]
    TypeResolution {
        /// The unresolved signature entry
        type_name: String,
    },

    /// No operation with this name exists in the descriptor
    #[error("No such operation known to the facade: {0}")]
    OperationNotFound(String),

    /// The underlying member call failed
    #[error("Error invoking {member}: {fault}")]
    Invocation {
        /// Attribute or operation name
        member: String,
        /// What went wrong
        fault: InvocationFault,
    },
}

impl DispatchError {
    /// Wrap a fault for the given member
    pub fn invocation(member: impl Into<String>, fault: InvocationFault) -> Self {
        DispatchError::Invocation {
            member: member.into(),
            fault,
        }
    }

    /// The invocation fault, if this is an invocation error
    pub fn fault(&self) -> Option<&InvocationFault> {
        match self {
            DispatchError::Invocation { fault, .. } => Some(fault),
            _ => None,
        }
    }
}

/// Failure raised while calling into a managed member.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvocationFault {
    /// A value did not match the declared type
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Declared type name
        expected: String,
        /// Kind of the supplied value
        got: String,
    },

    /// Wrong number of arguments
    #[error("Arity mismatch: expected {expected} arguments, got {got}")]
    Arity {
        /// Number of declared parameters
        expected: usize,
        /// Number of supplied arguments
        got: usize,
    },

    /// The name matched, but no overload has this signature
    #[error("No overload matching signature ({signature})")]
    NoMatchingSignature {
        /// Comma-separated resolved signature
        signature: String,
    },

    /// The managed instance was dropped by its owner
    #[error("Managed instance is no longer alive")]
    InstanceDropped,

    /// The member returned an error
    #[error("{0}")]
    Failed(String),

    /// The member panicked
    #[error("Member panicked: {0}")]
    Panicked(String),
}

impl From<ConversionError> for InvocationFault {
    fn from(err: ConversionError) -> Self {
        InvocationFault::TypeMismatch {
            expected: err.expected.to_string(),
            got: err.got.to_string(),
        }
    }
}

/// Conversion between a `ManagedValue` and a Rust type failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Type mismatch: expected {expected}, got {got}")]
pub struct ConversionError {
    /// Type the value was converted into
    pub expected: ManagedType,
    /// Kind of the value that was supplied
    pub got: &'static str,
}

/// Problems detected while building a descriptor.
///
/// These surface from facade construction, never from dispatch.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DescriptorError {
    /// Two fields on one type share a name
    #[error("Duplicate managed field '{field}' on {type_name}")]
    DuplicateField {
        /// Declaring type
        type_name: String,
        /// Field name
        field: String,
    },

    /// A getter and setter pair disagree on the attribute type
    #[error("Accessor type mismatch for attribute '{attribute}': getter returns {getter}, setter takes {setter}")]
    AccessorTypeMismatch {
        /// Derived attribute name
        attribute: String,
        /// Getter return type
        getter: ManagedType,
        /// Setter parameter type
        setter: ManagedType,
    },

    /// A type appears in its own ancestry
    #[error("Inheritance cycle through {type_name}")]
    InheritanceCycle {
        /// The repeated type
        type_name: String,
    },

    /// A member was declared with an empty name
    #[error("Empty member name on {type_name}")]
    EmptyName {
        /// Declaring type
        type_name: String,
    },
}
