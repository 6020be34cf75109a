//! Attribute Binder
//!
//! Reconciles accessor methods (`getX`/`isX`/`setX`) into logical attributes
//! and falls back to direct field access for marked fields that no accessor
//! covers.
//!
//! A method counts as an accessor only when its shape fits the prefix:
//!
//! | Prefix | Parameters | Return |
//! |--------|------------|--------|
//! | `get`  | none       | anything but `()` |
//! | `is`   | none       | `boolean` or `Option<boolean>` |
//! | `set`  | exactly one | anything |
//!
//! Everything else stays an operation.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::class::{FieldMember, FieldReader, FieldWriter, Invoker, MethodMember};
use crate::descriptor::{AccessKind, AttributeDescriptor};
use crate::error::DescriptorError;
use crate::types::ManagedType;

/// Role of an accessor method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorRole {
    /// `getX()`
    Getter,
    /// `isX()`
    Predicate,
    /// `setX(value)`
    Setter,
}

impl AccessorRole {
    /// Whether this role reads the attribute
    pub fn reads(&self) -> bool {
        matches!(self, AccessorRole::Getter | AccessorRole::Predicate)
    }
}

/// How a bound attribute reaches the instance
pub enum AttributeBinding<T> {
    /// Direct field access
    Field {
        read: FieldReader<T>,
        write: FieldWriter<T>,
    },
    /// Accessor methods; either side may be missing
    Accessor {
        getter: Option<Invoker<T>>,
        setter: Option<Invoker<T>>,
    },
}

/// Attribute descriptors plus their bindings, keyed by attribute name
pub struct AttributeTable<T> {
    pub descriptors: Vec<AttributeDescriptor>,
    pub bindings: FxHashMap<String, AttributeBinding<T>>,
}

impl<T> AttributeTable<T> {
    fn new() -> Self {
        AttributeTable {
            descriptors: Vec::new(),
            bindings: FxHashMap::default(),
        }
    }

    fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }
}

/// Derive the attribute name from an accessor suffix: `HitCount` -> `hitCount`.
pub fn attribute_name(suffix: &str) -> String {
    let mut chars = suffix.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Classify a method as an accessor, returning its role and attribute name.
pub fn accessor_role<T: 'static>(method: &MethodMember<T>) -> Option<(AccessorRole, String)> {
    let name = method.name();
    let params = method.parameter_types();
    let returns = method.return_type();

    let (role, suffix) = if let Some(suffix) = name.strip_prefix("get") {
        (AccessorRole::Getter, suffix)
    } else if let Some(suffix) = name.strip_prefix("set") {
        (AccessorRole::Setter, suffix)
    } else if let Some(suffix) = name.strip_prefix("is") {
        (AccessorRole::Predicate, suffix)
    } else {
        return None;
    };

    if suffix.is_empty() {
        return None;
    }

    let fits = match role {
        AccessorRole::Getter => params.is_empty() && *returns != ManagedType::Unit,
        AccessorRole::Predicate => params.is_empty() && returns.is_boolean(),
        AccessorRole::Setter => params.len() == 1,
    };

    fits.then(|| (role, attribute_name(suffix)))
}

/// Whether a method is bound as an attribute rather than cataloged as an operation
pub fn is_accessor<T: 'static>(method: &MethodMember<T>) -> bool {
    accessor_role(method).is_some()
}

/// Bind accessor methods and direct fields into attributes.
///
/// `methods` must be in scan order (most-derived first); the first accessor
/// seen for a name wins.
pub fn bind<T: 'static>(
    methods: &[MethodMember<T>],
    fields: &[FieldMember<T>],
) -> Result<AttributeTable<T>, DescriptorError> {
    let roles: Vec<Option<(AccessorRole, String)>> = methods.iter().map(accessor_role).collect();
    let mut table = AttributeTable::new();

    for (method, role) in methods.iter().zip(&roles) {
        let Some((role, name)) = role else {
            continue;
        };
        if table.contains(name) {
            continue;
        }

        let named = |wanted: fn(&AccessorRole) -> bool| {
            methods
                .iter()
                .zip(&roles)
                .filter_map(|(other, other_role)| match other_role {
                    Some((r, n)) if wanted(r) && n == name => Some(other),
                    _ => None,
                })
                .collect::<Vec<_>>()
        };

        let getter = if role.reads() {
            Some(method)
        } else {
            named(AccessorRole::reads)
                .into_iter()
                .find(|g| g.marker().readable)
        };

        // A getter pairs with the first setter of its own type
        let setter = match getter {
            Some(g) => {
                let setters = named(|r| *r == AccessorRole::Setter);
                let matching = setters
                    .iter()
                    .find(|s| s.parameter_types().first() == Some(g.return_type()));
                match (matching, setters.first()) {
                    (Some(s), _) => Some(*s),
                    (None, Some(s)) => {
                        return Err(DescriptorError::AccessorTypeMismatch {
                            attribute: name.clone(),
                            getter: g.return_type().clone(),
                            setter: s.parameter_types().first().cloned().unwrap_or(ManagedType::Unit),
                        });
                    }
                    (None, None) => None,
                }
            }
            None => Some(method),
        };

        let declared_type = match (getter, setter.and_then(|s| s.parameter_types().first())) {
            (Some(g), _) => g.return_type().clone(),
            (None, Some(ty)) => ty.clone(),
            (None, None) => continue,
        };

        let description = getter
            .or(setter)
            .map(|m| m.marker().description.clone())
            .unwrap_or_default();

        table.descriptors.push(AttributeDescriptor {
            name: name.clone(),
            declared_type,
            description,
            readable: getter.is_some_and(|g| g.marker().readable),
            writable: setter.is_some(),
            access: AccessKind::Accessor,
        });
        table.bindings.insert(
            name.clone(),
            AttributeBinding::Accessor {
                getter: getter.map(|g| g.invoker.clone()),
                setter: setter.map(|s| s.invoker.clone()),
            },
        );
    }

    let mut seen_fields = FxHashSet::default();
    for field in fields {
        if !seen_fields.insert(field.name()) {
            return Err(DescriptorError::DuplicateField {
                type_name: field.declared_by.to_string(),
                field: field.name().to_string(),
            });
        }
        if table.contains(field.name()) {
            log::warn!(
                "Field '{}' on {} is shadowed by accessor methods of the same attribute",
                field.name(),
                field.declared_by
            );
            continue;
        }

        let marker = field.marker();
        table.descriptors.push(AttributeDescriptor {
            name: field.name().to_string(),
            declared_type: field.value_type().clone(),
            description: marker.description.clone(),
            readable: marker.readable,
            writable: marker.writable,
            access: AccessKind::Field,
        });
        table.bindings.insert(
            field.name().to_string(),
            AttributeBinding::Field {
                read: field.read.clone(),
                write: field.write.clone(),
            },
        );
    }

    Ok(table)
}
