//! Dispatcher
//!
//! [`DynamicManaged`] is the contract every published object answers:
//! attribute reads and writes, batch variants, invocation by name and
//! signature, and its descriptor. [`ManagedFacade`] implements it for any
//! [`Managed`] type by dispatching through the binding table built once at
//! construction.
//!
//! ## Locking
//!
//! The facade only holds a `Weak` reference to the instance. Each request
//! upgrades it, then takes the instance lock:
//!
//! - field reads: read lock
//! - field writes and every method call: write lock
//!
//! Locks are released before a request returns; nothing is cached between
//! requests.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::binder::AttributeBinding;
use crate::class::Managed;
use crate::descriptor::{self, BindingTable, ManagementDescriptor};
use crate::error::{DescriptorError, DispatchError, DispatchResult, InvocationFault};
use crate::types::resolve_signature;
use crate::value::ManagedValue;

/// A named value, as carried by batch requests
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: ManagedValue,
}

impl Attribute {
    /// Pair a name with a value
    pub fn new(name: impl Into<String>, value: impl Into<ManagedValue>) -> Self {
        Attribute {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Ordered list of attributes
pub type AttributeList = Vec<Attribute>;

// ============================================================================
// Dispatch Contract
// ============================================================================

/// Runtime management interface of a published object.
pub trait DynamicManaged: Send + Sync {
    /// Read one attribute
    fn get_attribute(&self, name: &str) -> DispatchResult<ManagedValue>;

    /// Write one attribute. Values are never coerced to the declared type.
    fn set_attribute(&self, name: &str, value: ManagedValue) -> DispatchResult<()>;

    /// Invoke an operation.
    ///
    /// `signature` names the parameter type of each entry in `params`, e.g.
    /// `&["double", "double"]`, and selects among overloads.
    fn invoke(
        &self,
        name: &str,
        params: Vec<ManagedValue>,
        signature: &[&str],
    ) -> DispatchResult<ManagedValue>;

    /// Descriptor of everything this object exposes
    fn describe(&self) -> &ManagementDescriptor;

    /// Read several attributes; names that fail are omitted.
    fn get_attributes(&self, names: &[&str]) -> AttributeList {
        names
            .iter()
            .filter_map(|name| match self.get_attribute(name) {
                Ok(value) => Some(Attribute::new(*name, value)),
                Err(err) => {
                    log::warn!("Omitting attribute '{}' from batch read: {}", name, err);
                    None
                }
            })
            .collect()
    }

    /// Write several attributes, returning the value each reads back after the write.
    /// Entries that fail either step are omitted.
    fn set_attributes(&self, attributes: AttributeList) -> AttributeList {
        attributes
            .into_iter()
            .filter_map(|Attribute { name, value }| {
                let written = self
                    .set_attribute(&name, value)
                    .and_then(|()| self.get_attribute(&name));
                match written {
                    Ok(value) => Some(Attribute { name, value }),
                    Err(err) => {
                        log::warn!("Omitting attribute '{}' from batch write: {}", name, err);
                        None
                    }
                }
            })
            .collect()
    }
}

// ============================================================================
// Facade
// ============================================================================

/// Dispatches requests to a shared `T` through its declared members.
pub struct ManagedFacade<T: Managed> {
    instance: Weak<RwLock<T>>,
    descriptor: ManagementDescriptor,
    bindings: BindingTable<T>,
}

impl<T: Managed> ManagedFacade<T> {
    /// Build the descriptor for `T` and attach to `instance`.
    ///
    /// The facade does not keep `instance` alive.
    pub fn new(
        instance: &Arc<RwLock<T>>,
        description: impl Into<String>,
    ) -> Result<Self, DescriptorError> {
        let (descriptor, bindings) = descriptor::build::<T>(description)?;
        log::debug!("Created management facade for {}", descriptor.type_name);
        Ok(ManagedFacade {
            instance: Arc::downgrade(instance),
            descriptor,
            bindings,
        })
    }

    /// Whether the managed instance is still alive
    pub fn is_alive(&self) -> bool {
        self.instance.strong_count() > 0
    }

    fn upgrade(&self, member: &str) -> DispatchResult<Arc<RwLock<T>>> {
        self.instance
            .upgrade()
            .ok_or_else(|| fail(member, InvocationFault::InstanceDropped))
    }
}

impl<T: Managed> DynamicManaged for ManagedFacade<T> {
    fn get_attribute(&self, name: &str) -> DispatchResult<ManagedValue> {
        log::debug!("get_attribute {}.{}", self.descriptor.type_name, name);

        let attribute = self
            .descriptor
            .attribute(name)
            .ok_or_else(|| DispatchError::AttributeNotFound(name.to_string()))?;
        if !attribute.readable {
            return Err(DispatchError::AttributeNotReadable(name.to_string()));
        }

        match self.bindings.attributes.get(name) {
            Some(AttributeBinding::Field { read, .. }) => {
                let instance = self.upgrade(name)?;
                guarded(name, || {
                    let target = instance.read();
                    Ok(read(&*target))
                })
            }
            Some(AttributeBinding::Accessor {
                getter: Some(getter),
                ..
            }) => {
                let instance = self.upgrade(name)?;
                guarded(name, || {
                    let mut target = instance.write();
                    getter(&mut *target, Vec::new())
                })
            }
            Some(AttributeBinding::Accessor { getter: None, .. }) => {
                Err(DispatchError::AttributeNotReadable(name.to_string()))
            }
            None => Err(DispatchError::AttributeNotFound(name.to_string())),
        }
    }

    fn set_attribute(&self, name: &str, value: ManagedValue) -> DispatchResult<()> {
        log::debug!("set_attribute {}.{}", self.descriptor.type_name, name);

        let attribute = self
            .descriptor
            .attribute(name)
            .ok_or_else(|| DispatchError::AttributeNotFound(name.to_string()))?;
        if !attribute.writable {
            return Err(DispatchError::AttributeNotWritable(name.to_string()));
        }

        match self.bindings.attributes.get(name) {
            Some(AttributeBinding::Field { write, .. }) => {
                let instance = self.upgrade(name)?;
                guarded(name, || {
                    let mut target = instance.write();
                    write(&mut *target, value).map_err(InvocationFault::from)
                })
            }
            Some(AttributeBinding::Accessor {
                setter: Some(setter),
                ..
            }) => {
                let instance = self.upgrade(name)?;
                guarded(name, || {
                    let mut target = instance.write();
                    setter(&mut *target, vec![value]).map(|_| ())
                })
            }
            Some(AttributeBinding::Accessor { setter: None, .. }) => {
                Err(DispatchError::AttributeNotWritable(name.to_string()))
            }
            None => Err(DispatchError::AttributeNotFound(name.to_string())),
        }
    }

    fn invoke(
        &self,
        name: &str,
        params: Vec<ManagedValue>,
        signature: &[&str],
    ) -> DispatchResult<ManagedValue> {
        log::debug!(
            "invoke {}.{}({})",
            self.descriptor.type_name,
            name,
            signature.join(", ")
        );

        if !self.descriptor.has_operation(name) {
            return Err(DispatchError::OperationNotFound(name.to_string()));
        }

        let wanted = resolve_signature(signature)?;
        if params.len() != wanted.len() {
            return Err(fail(
                name,
                InvocationFault::Arity {
                    expected: wanted.len(),
                    got: params.len(),
                },
            ));
        }

        let index = self
            .descriptor
            .operations
            .iter()
            .position(|op| op.name == name && op.parameter_types == wanted)
            .ok_or_else(|| {
                fail(
                    name,
                    InvocationFault::NoMatchingSignature {
                        signature: signature.join(", "),
                    },
                )
            })?;

        let invoker = &self.bindings.operations[index];
        let instance = self.upgrade(name)?;
        guarded(name, || {
            let mut target = instance.write();
            invoker(&mut *target, params)
        })
    }

    fn describe(&self) -> &ManagementDescriptor {
        &self.descriptor
    }
}

impl<T: Managed> fmt::Debug for ManagedFacade<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedFacade")
            .field("type_name", &self.descriptor.type_name)
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl fmt::Debug for dyn DynamicManaged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicManaged")
            .field("type_name", &self.describe().type_name)
            .finish()
    }
}

fn fail(member: &str, fault: InvocationFault) -> DispatchError {
    log::error!("Error invoking {}: {}", member, fault);
    DispatchError::invocation(member, fault)
}

/// Run a member call, turning faults and panics into invocation errors.
fn guarded<R>(
    member: &str,
    call: impl FnOnce() -> Result<R, InvocationFault>,
) -> DispatchResult<R> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result.map_err(|fault| fail(member, fault)),
        Err(payload) => Err(fail(member, InvocationFault::Panicked(panic_message(&*payload)))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
