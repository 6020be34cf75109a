//! Managed Type Model
//!
//! Every attribute, parameter, and return value has a `ManagedType`. Callers
//! name types in invocation signatures as plain strings; this module resolves
//! those strings back into `ManagedType`s.
//!
//! ## Resolution order
//!
//! 1. The reserved primitive keywords (`boolean`, `int`, `char`, `long`,
//!    `double`, `float`, `byte`, `short`)
//! 2. Structural names: `()`, `String`, `Option<kw>`, `Vec<..>`
//! 3. The process-wide named-type registry

use std::fmt;
use std::sync::LazyLock;

use parking_lot::RwLock;
use rustc_hash::FxHashSet;

use crate::error::DispatchError;

/// Primitive value kinds addressable by a reserved keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// `bool`
    Boolean,
    /// `char`
    Char,
    /// `i8`
    Byte,
    /// `i16`
    Short,
    /// `i32`
    Int,
    /// `i64`
    Long,
    /// `f32`
    Float,
    /// `f64`
    Double,
}

impl Primitive {
    /// All primitives, in keyword table order
    pub const ALL: [Primitive; 8] = [
        Primitive::Boolean,
        Primitive::Int,
        Primitive::Char,
        Primitive::Long,
        Primitive::Double,
        Primitive::Float,
        Primitive::Byte,
        Primitive::Short,
    ];

    /// The reserved signature keyword for this primitive
    pub const fn keyword(&self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Char => "char",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }

    /// Look up a primitive by its reserved keyword
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.keyword() == keyword)
    }
}

/// Semantic type of a managed member slot
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ManagedType {
    /// No value (`()`)
    Unit,
    /// A primitive held by value
    Primitive(Primitive),
    /// A nullable primitive (`Option<prim>`)
    Boxed(Primitive),
    /// Owned text
    Text,
    /// Homogeneous list
    List(Box<ManagedType>),
    /// Any other registered type, by name
    Named(String),
}

impl ManagedType {
    /// Canonical name, as accepted by [`resolve_type`]
    pub fn name(&self) -> String {
        self.to_string()
    }

    /// Whether values of this type can answer an `is` predicate
    pub fn is_boolean(&self) -> bool {
        matches!(
            self,
            ManagedType::Primitive(Primitive::Boolean) | ManagedType::Boxed(Primitive::Boolean)
        )
    }
}

impl fmt::Display for ManagedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManagedType::Unit => write!(f, "()"),
            ManagedType::Primitive(p) => write!(f, "{}", p.keyword()),
            ManagedType::Boxed(p) => write!(f, "Option<{}>", p.keyword()),
            ManagedType::Text => write!(f, "String"),
            ManagedType::List(inner) => write!(f, "Vec<{}>", inner),
            ManagedType::Named(name) => write!(f, "{}", name),
        }
    }
}

// ============================================================================
// Named Type Registry
// ============================================================================

static NAMED_TYPES: LazyLock<RwLock<FxHashSet<String>>> =
    LazyLock::new(|| RwLock::new(FxHashSet::default()));

/// Make a named type resolvable from invocation signatures.
pub fn register_named_type(name: impl Into<String>) {
    NAMED_TYPES.write().insert(name.into());
}

/// Whether a named type has been registered
pub fn is_named_type_registered(name: &str) -> bool {
    NAMED_TYPES.read().contains(name)
}

/// Record every named type reachable from `ty`
pub(crate) fn note_type(ty: &ManagedType) {
    match ty {
        ManagedType::Named(name) => {
            if !is_named_type_registered(name) {
                register_named_type(name.clone());
            }
        }
        ManagedType::List(inner) => note_type(inner),
        _ => {}
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve a caller-supplied type name.
pub fn resolve_type(name: &str) -> Result<ManagedType, DispatchError> {
    let unresolved = || DispatchError::TypeResolution {
        type_name: name.to_string(),
    };

    if let Some(primitive) = Primitive::from_keyword(name) {
        return Ok(ManagedType::Primitive(primitive));
    }

    match name {
        "()" => return Ok(ManagedType::Unit),
        "String" => return Ok(ManagedType::Text),
        _ => {}
    }

    if let Some(inner) = generic_argument(name, "Option") {
        return Primitive::from_keyword(inner)
            .map(ManagedType::Boxed)
            .ok_or_else(unresolved);
    }

    if let Some(inner) = generic_argument(name, "Vec") {
        return resolve_type(inner)
            .map(|ty| ManagedType::List(Box::new(ty)))
            .map_err(|_| unresolved());
    }

    if is_named_type_registered(name) {
        Ok(ManagedType::Named(name.to_string()))
    } else {
        Err(unresolved())
    }
}

/// Resolve a whole signature, failing on the first unresolvable entry
pub fn resolve_signature<S: AsRef<str>>(signature: &[S]) -> Result<Vec<ManagedType>, DispatchError> {
    signature.iter().map(|s| resolve_type(s.as_ref())).collect()
}

/// `Outer<inner>` -> `inner`
fn generic_argument<'a>(name: &'a str, outer: &str) -> Option<&'a str> {
    name.strip_prefix(outer)?
        .strip_prefix('<')?
        .strip_suffix('>')
        .map(str::trim)
}
