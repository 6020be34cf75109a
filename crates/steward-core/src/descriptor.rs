//! Descriptor Builder
//!
//! Aggregates the binder and catalog output into one immutable
//! [`ManagementDescriptor`], plus the parallel [`BindingTable`] holding the
//! callables the dispatcher needs.

use rustc_hash::FxHashMap;

use crate::binder::{self, AttributeBinding};
use crate::catalog;
use crate::class::{Invoker, Managed};
use crate::error::DescriptorError;
use crate::scanner;
use crate::types::{note_type, ManagedType};

/// How an attribute is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    /// Direct field read/write
    Field,
    /// Getter/predicate and/or setter methods
    Accessor,
}

/// A named, typed attribute
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDescriptor {
    /// Attribute name, unique within a descriptor
    pub name: String,
    /// Declared value type
    pub declared_type: ManagedType,
    /// Human-readable description
    pub description: String,
    /// Whether `get_attribute` is allowed
    pub readable: bool,
    /// Whether `set_attribute` is allowed
    pub writable: bool,
    /// Field or accessor backing
    pub access: AccessKind,
}

/// A named operation; overloads share the name
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDescriptor {
    pub name: String,
    pub description: String,
    pub parameter_types: Vec<ManagedType>,
    pub return_type: ManagedType,
    /// Type that declared the method (an ancestor for inherited methods)
    pub declared_by: String,
}

/// A declared constructor signature
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDescriptor {
    pub description: String,
    pub parameter_types: Vec<ManagedType>,
}

/// Immutable description of everything a managed object exposes.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagementDescriptor {
    /// Most-derived type name
    pub type_name: String,
    /// Caller-supplied description
    pub description: String,
    /// Attributes, names unique
    pub attributes: Vec<AttributeDescriptor>,
    /// Operations in scan order, names may repeat
    pub operations: Vec<OperationDescriptor>,
    /// Constructors in declaration order
    pub constructors: Vec<ConstructorDescriptor>,
}

impl ManagementDescriptor {
    /// Empty descriptor for a type
    pub fn new(type_name: impl Into<String>, description: impl Into<String>) -> Self {
        ManagementDescriptor {
            type_name: type_name.into(),
            description: description.into(),
            attributes: Vec::new(),
            operations: Vec::new(),
            constructors: Vec::new(),
        }
    }

    /// Look up an attribute by name
    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Whether any operation has this name
    pub fn has_operation(&self, name: &str) -> bool {
        self.operations.iter().any(|op| op.name == name)
    }

    /// All overloads with this name, in scan order
    pub fn operations_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a OperationDescriptor> + 'a {
        self.operations.iter().filter(move |op| op.name == name)
    }

    /// Whether nothing is exposed
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.operations.is_empty() && self.constructors.is_empty()
    }
}

/// Callables behind a descriptor.
///
/// `operations[i]` invokes `descriptor.operations[i]`.
pub struct BindingTable<T> {
    pub(crate) attributes: FxHashMap<String, AttributeBinding<T>>,
    pub(crate) operations: Vec<Invoker<T>>,
}

/// Scan, bind, and catalog `T` into a descriptor and its binding table.
pub fn build<T: Managed>(
    description: impl Into<String>,
) -> Result<(ManagementDescriptor, BindingTable<T>), DescriptorError> {
    let scanned = scanner::scan::<T>()?;
    let attributes = binder::bind(&scanned.methods, &scanned.fields)?;
    let operations = catalog::catalog(&scanned.methods);

    let descriptor = ManagementDescriptor {
        type_name: scanned.type_name.to_string(),
        description: description.into(),
        attributes: attributes.descriptors,
        operations: operations.descriptors,
        constructors: catalog::describe_constructors(&scanned.constructors),
    };

    for attribute in &descriptor.attributes {
        note_type(&attribute.declared_type);
    }
    for operation in &descriptor.operations {
        operation.parameter_types.iter().for_each(note_type);
        note_type(&operation.return_type);
    }
    for ctor in &descriptor.constructors {
        ctor.parameter_types.iter().for_each(note_type);
    }

    log::debug!(
        "Built descriptor for {}: {} attributes, {} operations, {} constructors",
        descriptor.type_name,
        descriptor.attributes.len(),
        descriptor.operations.len(),
        descriptor.constructors.len()
    );

    let bindings = BindingTable {
        attributes: attributes.bindings,
        operations: operations.invokers,
    };
    Ok((descriptor, bindings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassBuilder;
    use crate::marker::ManagedMarker;
    use crate::types::resolve_type;

    struct Bare;

    impl Managed for Bare {
        fn declare(_class: &mut ClassBuilder<Self>) {}
    }

    #[test]
    fn test_unmarked_type_yields_empty_descriptor() {
        let (descriptor, bindings) = build::<Bare>("nothing here").unwrap();
        assert!(descriptor.is_empty());
        assert_eq!(descriptor.description, "nothing here");
        assert_eq!(descriptor.type_name, std::any::type_name::<Bare>());
        assert!(bindings.attributes.is_empty());
        assert!(bindings.operations.is_empty());
    }

    #[derive(Clone)]
    struct Route {
        hops: i32,
    }

    crate::impl_opaque_value!(Route, "descriptor.tests.Route");

    struct Router {
        routes: Vec<Route>,
    }

    impl Managed for Router {
        fn declare(class: &mut ClassBuilder<Self>) {
            class
                .method("getRoutes", ManagedMarker::new(), |r: &mut Self| r.routes.clone())
                .method("add", ManagedMarker::new(), |r: &mut Self, route: Route| {
                    r.routes.push(route)
                })
                .method("add", ManagedMarker::new(), |r: &mut Self, hops: i32| {
                    r.routes.push(Route { hops })
                });
        }

        fn type_name() -> &'static str {
            "net.Router"
        }
    }

    #[test]
    fn test_build_records_named_types() {
        let (descriptor, _) = build::<Router>("Routing table").unwrap();
        assert_eq!(descriptor.type_name, "net.Router");
        assert_eq!(descriptor.operations_named("add").count(), 2);
        assert!(descriptor.has_operation("add"));
        assert!(!descriptor.has_operation("getRoutes"));

        let routes = descriptor.attribute("routes").unwrap();
        assert_eq!(routes.declared_type.name(), "Vec<descriptor.tests.Route>");
        assert!(resolve_type("descriptor.tests.Route").is_ok());
        assert_eq!(Route { hops: 3 }.hops, 3);
    }
}
