//! Member Scanner
//!
//! Collects the members a type declared in [`Managed::declare`]:
//!
//! - fields and constructors of the type itself only
//! - methods of the type followed by those of every ancestor, most-derived
//!   first, each lifted so it runs against the child instance
//!
//! Overridden methods show up once per level; later stages keep the first
//! (most-derived) occurrence where names collide.

use crate::class::{ClassBuilder, ConstructorMember, FieldMember, Managed, MethodMember};
use crate::error::DescriptorError;

/// Members gathered for one managed type
pub struct ScannedMembers<T> {
    /// Most-derived type name
    pub type_name: &'static str,
    /// Fields declared directly on the type
    pub fields: Vec<FieldMember<T>>,
    /// Methods of the type and all ancestors, most-derived first
    pub methods: Vec<MethodMember<T>>,
    /// Constructors declared directly on the type
    pub constructors: Vec<ConstructorMember>,
}

/// Scan the managed members of `T` and its ancestors
pub fn scan<T: Managed>() -> Result<ScannedMembers<T>, DescriptorError> {
    scan_lineage::<T>(&mut Vec::new())
}

pub(crate) fn scan_lineage<T: Managed>(
    lineage: &mut Vec<&'static str>,
) -> Result<ScannedMembers<T>, DescriptorError> {
    let type_name = T::type_name();
    if lineage.contains(&type_name) {
        return Err(DescriptorError::InheritanceCycle {
            type_name: type_name.to_string(),
        });
    }
    lineage.push(type_name);

    let mut class = ClassBuilder::<T>::new();
    T::declare(&mut class);

    if let Some(err) = class.errors.drain(..).next() {
        return Err(err);
    }

    let mut methods = std::mem::take(&mut class.methods);
    if let Some(parent) = class.parent.take() {
        log::trace!("{} inherits managed methods from {}", type_name, parent.type_name);
        methods.extend((parent.inherit)(lineage)?);
    }

    Ok(ScannedMembers {
        type_name,
        fields: class.fields,
        methods,
        constructors: class.constructors,
    })
}
