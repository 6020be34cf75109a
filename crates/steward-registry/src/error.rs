//! Registry error types

use steward_core::{DescriptorError, DispatchError};
use thiserror::Error;

use crate::name::ObjectName;

/// Errors from publishing, withdrawing, and routing requests.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// An object is already published under this name
    #[error("An object is already published as {0}")]
    PublishConflict(ObjectName),

    /// Nothing to withdraw under this name
    #[error("No object published as {0} to withdraw")]
    WithdrawNotFound(ObjectName),

    /// A routed request named an unpublished object
    #[error("No object published as {0}")]
    InstanceNotFound(ObjectName),

    /// The object name could not be formed
    #[error(transparent)]
    Name(#[from] NameError),

    /// The facade descriptor could not be built
    #[error("Failed to build management facade: {0}")]
    Descriptor(#[from] DescriptorError),

    /// A routed request failed inside the published object
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Malformed object names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    /// Domain part is empty
    #[error("Object name '{0}' has an empty domain")]
    EmptyDomain(String),

    /// No `:` between domain and properties
    #[error("Object name '{0}' is missing the ':' separator")]
    MissingSeparator(String),

    /// No key properties after the domain
    #[error("Object name '{0}' has no key properties")]
    NoProperties(String),

    /// A property is not of the form `key=value`
    #[error("Malformed key property '{property}' in '{name}'")]
    MalformedProperty {
        /// The full name
        name: String,
        /// The offending property
        property: String,
    },

    /// A key appears twice
    #[error("Duplicate key '{key}' in '{name}'")]
    DuplicateKey {
        /// The full name
        name: String,
        /// The repeated key
        key: String,
    },

    /// A reserved character appears where it isn't allowed
    #[error("Invalid character {character:?} in '{part}'")]
    InvalidCharacter {
        /// Domain, key, or value containing the character
        part: String,
        /// The reserved character
        character: char,
    },

    /// The type has no module path to use as a domain
    #[error("Type '{0}' has no module path to derive a domain from")]
    NoModulePath(String),
}

/// Errors loading a registry configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid config: {0}")]
    ValidationError(String),
}
