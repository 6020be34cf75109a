//! Steward Core - management facades for arbitrary Rust objects
//!
//! A type opts individual members into management by implementing
//! [`Managed`]. [`ManagedFacade`] turns a shared instance of such a type into
//! a [`DynamicManaged`] object whose attributes can be read and written and
//! whose operations can be invoked by name and signature.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use parking_lot::RwLock;
//! use steward_core::{ClassBuilder, DynamicManaged, Managed, ManagedFacade, ManagedMarker};
//!
//! struct Cache { capacity: i32 }
//!
//! impl Managed for Cache {
//!     fn declare(class: &mut ClassBuilder<Self>) {
//!         class
//!             .method("getCapacity", ManagedMarker::described("Max entries"), |c: &mut Self| c.capacity)
//!             .method("setCapacity", ManagedMarker::new(), |c: &mut Self, n: i32| c.capacity = n);
//!     }
//! }
//!
//! let cache = Arc::new(RwLock::new(Cache { capacity: 64 }));
//! let facade = ManagedFacade::new(&cache, "Response cache")?;
//! facade.set_attribute("capacity", 128.into())?;
//! ```

pub mod binder;
pub mod catalog;
pub mod class;
pub mod descriptor;
pub mod dispatcher;
pub mod error;
pub mod marker;
pub mod scanner;
pub mod types;
pub mod value;

pub use binder::{AccessorRole, AttributeBinding, AttributeTable};
pub use class::{ClassBuilder, IntoMethod, Managed, Signature};
pub use descriptor::{
    AccessKind, AttributeDescriptor, ConstructorDescriptor, ManagementDescriptor,
    OperationDescriptor,
};
pub use dispatcher::{Attribute, AttributeList, DynamicManaged, ManagedFacade};
pub use error::{ConversionError, DescriptorError, DispatchError, DispatchResult, InvocationFault};
pub use marker::{ManagedMarker, DEFAULT_DESCRIPTION};
pub use scanner::{scan, ScannedMembers};
pub use types::{
    is_named_type_registered, register_named_type, resolve_signature, resolve_type, ManagedType,
    Primitive,
};
pub use value::{FromManaged, IntoManaged, ManagedReturn, ManagedValue, OpaqueValue, TypeOf};
