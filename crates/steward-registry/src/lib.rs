//! Steward Registry - publishes managed objects under object names
//!
//! ```ignore
//! use steward_registry::{ManagementRegistry, RegistryConfig};
//!
//! let registry = ManagementRegistry::start(RegistryConfig::load(path)?)?;
//! let name = registry.publish_managed(&pool, "Ingest workers")?;
//! registry.invoke(&name, "restart", vec![], &[])?;
//! registry.drain();
//! ```

pub mod config;
pub mod error;
pub mod name;
pub mod registry;

pub use config::RegistryConfig;
pub use error::{ConfigError, NameError, RegistryError};
pub use name::ObjectName;
pub use registry::{compute_name, name_for_type, ManagementRegistry, REGISTERED_OBJECTS, REGISTRY_TYPE};
