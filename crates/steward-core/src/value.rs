//! Managed values and conversions
//!
//! `ManagedValue` is the dynamically typed value passed through the dispatch
//! contract. Rust types opt into the contract with three traits:
//!
//! - [`TypeOf`]: the `ManagedType` describing the Rust type
//! - [`FromManaged`]: strict conversion out of a `ManagedValue`
//! - [`IntoManaged`]: conversion into a `ManagedValue`
//!
//! Conversions never coerce: an `Int` does not become a `Long`, and `Null`
//! only converts into `Option<_>`.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::ConversionError;
use crate::types::{ManagedType, Primitive};

/// Dynamically typed value exchanged with managed members
#[derive(Clone)]
pub enum ManagedValue {
    /// Absent value
    Null,
    /// `bool`
    Boolean(bool),
    /// `char`
    Char(char),
    /// `i8`
    Byte(i8),
    /// `i16`
    Short(i16),
    /// `i32`
    Int(i32),
    /// `i64`
    Long(i64),
    /// `f32`
    Float(f32),
    /// `f64`
    Double(f64),
    /// `String`
    Text(String),
    /// `Vec<_>`
    List(Vec<ManagedValue>),
    /// A registered user type
    Opaque(OpaqueValue),
}

impl ManagedValue {
    /// Short name of the value's kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            ManagedValue::Null => "null",
            ManagedValue::Boolean(_) => "boolean",
            ManagedValue::Char(_) => "char",
            ManagedValue::Byte(_) => "byte",
            ManagedValue::Short(_) => "short",
            ManagedValue::Int(_) => "int",
            ManagedValue::Long(_) => "long",
            ManagedValue::Float(_) => "float",
            ManagedValue::Double(_) => "double",
            ManagedValue::Text(_) => "String",
            ManagedValue::List(_) => "Vec",
            ManagedValue::Opaque(_) => "opaque",
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, ManagedValue::Null)
    }

    /// Get as text if this is a text value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ManagedValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert into a Rust type
    pub fn extract<T: FromManaged>(self) -> Result<T, ConversionError> {
        T::from_managed(self)
    }
}

impl PartialEq for ManagedValue {
    fn eq(&self, other: &Self) -> bool {
        use ManagedValue::*;
        match (self, other) {
            (Null, Null) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (Char(a), Char(b)) => a == b,
            (Byte(a), Byte(b)) => a == b,
            (Short(a), Short(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Long(a), Long(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Double(a), Double(b)) => a == b,
            (Text(a), Text(b)) => a == b,
            (List(a), List(b)) => a == b,
            (Opaque(a), Opaque(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for ManagedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManagedValue::Null => write!(f, "Null"),
            ManagedValue::Boolean(v) => write!(f, "Boolean({})", v),
            ManagedValue::Char(v) => write!(f, "Char({:?})", v),
            ManagedValue::Byte(v) => write!(f, "Byte({})", v),
            ManagedValue::Short(v) => write!(f, "Short({})", v),
            ManagedValue::Int(v) => write!(f, "Int({})", v),
            ManagedValue::Long(v) => write!(f, "Long({})", v),
            ManagedValue::Float(v) => write!(f, "Float({})", v),
            ManagedValue::Double(v) => write!(f, "Double({})", v),
            ManagedValue::Text(v) => write!(f, "Text({:?})", v),
            ManagedValue::List(v) => f.debug_tuple("List").field(v).finish(),
            ManagedValue::Opaque(v) => write!(f, "Opaque({})", v.type_name()),
        }
    }
}

// ============================================================================
// Opaque Values
// ============================================================================

/// Shared handle to a value of a registered user type.
///
/// Equality is identity: two opaque values are equal when they share the
/// same allocation.
#[derive(Clone)]
pub struct OpaqueValue {
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

impl OpaqueValue {
    /// Wrap a value under a managed type name
    pub fn new<T: Any + Send + Sync>(type_name: &'static str, value: T) -> Self {
        OpaqueValue {
            type_name,
            value: Arc::new(value),
        }
    }

    /// The managed type name of the payload
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Borrow the payload as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl PartialEq for OpaqueValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

// ============================================================================
// Conversion Traits
// ============================================================================

/// Rust types with a managed type.
pub trait TypeOf {
    /// The managed type describing `Self`
    fn managed_type() -> ManagedType;
}

/// Convert from ManagedValue to a Rust type.
pub trait FromManaged: Sized {
    /// Convert, returning an error if the value kind doesn't match
    fn from_managed(value: ManagedValue) -> Result<Self, ConversionError>;
}

/// Convert a Rust type into a ManagedValue.
pub trait IntoManaged {
    /// Convert into a ManagedValue
    fn into_managed(self) -> ManagedValue;
}

/// Return values of managed methods.
///
/// Implemented for every [`IntoManaged`] type and for `Result<R, E>`, whose
/// `Err` side becomes an invocation failure.
pub trait ManagedReturn {
    /// Declared return type
    fn return_type() -> ManagedType;

    /// Convert the returned value, or describe the failure
    fn into_return(self) -> Result<ManagedValue, String>;
}

impl<R, E> ManagedReturn for Result<R, E>
where
    R: IntoManaged + TypeOf,
    E: fmt::Display,
{
    fn return_type() -> ManagedType {
        R::managed_type()
    }

    fn into_return(self) -> Result<ManagedValue, String> {
        self.map(IntoManaged::into_managed).map_err(|e| e.to_string())
    }
}

fn mismatch<T: TypeOf>(value: &ManagedValue) -> ConversionError {
    ConversionError {
        expected: T::managed_type(),
        got: value.kind(),
    }
}

// ============================================================================
// Primitive Type Implementations
// ============================================================================

macro_rules! impl_primitive {
    ($($ty:ty => $variant:ident, $prim:ident;)*) => {
        $(
            impl TypeOf for $ty {
                fn managed_type() -> ManagedType {
                    ManagedType::Primitive(Primitive::$prim)
                }
            }

            impl FromManaged for $ty {
                fn from_managed(value: ManagedValue) -> Result<Self, ConversionError> {
                    match value {
                        ManagedValue::$variant(v) => Ok(v),
                        other => Err(mismatch::<$ty>(&other)),
                    }
                }
            }

            impl IntoManaged for $ty {
                fn into_managed(self) -> ManagedValue {
                    ManagedValue::$variant(self)
                }
            }

            impl From<$ty> for ManagedValue {
                fn from(v: $ty) -> Self {
                    ManagedValue::$variant(v)
                }
            }

            impl TypeOf for Option<$ty> {
                fn managed_type() -> ManagedType {
                    ManagedType::Boxed(Primitive::$prim)
                }
            }

            impl FromManaged for Option<$ty> {
                fn from_managed(value: ManagedValue) -> Result<Self, ConversionError> {
                    match value {
                        ManagedValue::Null => Ok(None),
                        ManagedValue::$variant(v) => Ok(Some(v)),
                        other => Err(mismatch::<Option<$ty>>(&other)),
                    }
                }
            }

            impl IntoManaged for Option<$ty> {
                fn into_managed(self) -> ManagedValue {
                    self.map_or(ManagedValue::Null, ManagedValue::$variant)
                }
            }

            impl_managed_return!($ty, Option<$ty>);
        )*
    };
}

macro_rules! impl_managed_return {
    ($($ty:ty),*) => {
        $(
            impl ManagedReturn for $ty {
                fn return_type() -> ManagedType {
                    <$ty as TypeOf>::managed_type()
                }

                fn into_return(self) -> Result<ManagedValue, String> {
                    Ok(self.into_managed())
                }
            }
        )*
    };
}

impl_primitive! {
    bool => Boolean, Boolean;
    char => Char, Char;
    i8 => Byte, Byte;
    i16 => Short, Short;
    i32 => Int, Int;
    i64 => Long, Long;
    f32 => Float, Float;
    f64 => Double, Double;
}

impl TypeOf for () {
    fn managed_type() -> ManagedType {
        ManagedType::Unit
    }
}

impl FromManaged for () {
    fn from_managed(value: ManagedValue) -> Result<Self, ConversionError> {
        match value {
            ManagedValue::Null => Ok(()),
            other => Err(mismatch::<()>(&other)),
        }
    }
}

impl IntoManaged for () {
    fn into_managed(self) -> ManagedValue {
        ManagedValue::Null
    }
}

impl TypeOf for String {
    fn managed_type() -> ManagedType {
        ManagedType::Text
    }
}

impl FromManaged for String {
    fn from_managed(value: ManagedValue) -> Result<Self, ConversionError> {
        match value {
            ManagedValue::Text(s) => Ok(s),
            other => Err(mismatch::<String>(&other)),
        }
    }
}

impl IntoManaged for String {
    fn into_managed(self) -> ManagedValue {
        ManagedValue::Text(self)
    }
}

impl From<String> for ManagedValue {
    fn from(s: String) -> Self {
        ManagedValue::Text(s)
    }
}

impl From<&str> for ManagedValue {
    fn from(s: &str) -> Self {
        ManagedValue::Text(s.to_string())
    }
}

impl_managed_return!((), String);

impl<T: TypeOf> TypeOf for Vec<T> {
    fn managed_type() -> ManagedType {
        ManagedType::List(Box::new(T::managed_type()))
    }
}

impl<T: FromManaged + TypeOf> FromManaged for Vec<T> {
    fn from_managed(value: ManagedValue) -> Result<Self, ConversionError> {
        match value {
            ManagedValue::List(items) => items.into_iter().map(T::from_managed).collect(),
            other => Err(mismatch::<Vec<T>>(&other)),
        }
    }
}

impl<T: IntoManaged> IntoManaged for Vec<T> {
    fn into_managed(self) -> ManagedValue {
        ManagedValue::List(self.into_iter().map(IntoManaged::into_managed).collect())
    }
}

impl<T: IntoManaged + TypeOf> ManagedReturn for Vec<T> {
    fn return_type() -> ManagedType {
        <Vec<T> as TypeOf>::managed_type()
    }

    fn into_return(self) -> Result<ManagedValue, String> {
        Ok(self.into_managed())
    }
}

/// Expose a user type as a named managed type backed by [`OpaqueValue`].
///
/// The type must be `Clone + Send + Sync + 'static`. The name is registered
/// for signature resolution the first time a class declares a member using
/// it, or explicitly through [`register_named_type`](crate::register_named_type).
///
/// ```ignore
/// #[derive(Clone)]
/// struct Endpoint { host: String, port: u16 }
///
/// steward_core::impl_opaque_value!(Endpoint, "net.Endpoint");
/// ```
#[macro_export]
macro_rules! impl_opaque_value {
    ($ty:ty, $name:expr) => {
        impl $crate::TypeOf for $ty {
            fn managed_type() -> $crate::ManagedType {
                $crate::ManagedType::Named(::std::string::String::from($name))
            }
        }

        impl $crate::FromManaged for $ty {
            fn from_managed(
                value: $crate::ManagedValue,
            ) -> ::std::result::Result<Self, $crate::ConversionError> {
                let kind = value.kind();
                match value {
                    $crate::ManagedValue::Opaque(opaque) if opaque.type_name() == $name => opaque
                        .downcast_ref::<$ty>()
                        .cloned()
                        .ok_or($crate::ConversionError {
                            expected: <$ty as $crate::TypeOf>::managed_type(),
                            got: kind,
                        }),
                    _ => ::std::result::Result::Err($crate::ConversionError {
                        expected: <$ty as $crate::TypeOf>::managed_type(),
                        got: kind,
                    }),
                }
            }
        }

        impl $crate::IntoManaged for $ty {
            fn into_managed(self) -> $crate::ManagedValue {
                $crate::ManagedValue::Opaque($crate::OpaqueValue::new($name, self))
            }
        }

        impl $crate::ManagedReturn for $ty {
            fn return_type() -> $crate::ManagedType {
                <$ty as $crate::TypeOf>::managed_type()
            }

            fn into_return(
                self,
            ) -> ::std::result::Result<$crate::ManagedValue, ::std::string::String> {
                ::std::result::Result::Ok($crate::IntoManaged::into_managed(self))
            }
        }
    };
}
