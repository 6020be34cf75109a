//! Managed member declarations
//!
//! Rust has no runtime reflection, so a type lists its managed members once
//! in [`Managed::declare`]. Each declaration pairs a [`ManagedMarker`] with a
//! stored function reference; the scanner and binder work purely from these
//! stored members.
//!
//! ```ignore
//! struct Pool { size: i32, base: Service }
//!
//! impl Managed for Pool {
//!     fn declare(class: &mut ClassBuilder<Self>) {
//!         class
//!             .extends::<Service>(|pool| &mut pool.base)
//!             .constructor::<(i32,)>(ManagedMarker::described("Pool with a fixed size"))
//!             .field("size", ManagedMarker::new().writable(true), |p| &p.size, |p| &mut p.size)
//!             .method("drain", ManagedMarker::described("Drop idle entries"), |p: &mut Self| p.drain());
//!     }
//! }
//! ```

use std::sync::Arc;

use crate::error::{ConversionError, DescriptorError, InvocationFault};
use crate::marker::ManagedMarker;
use crate::scanner;
use crate::types::ManagedType;
use crate::value::{FromManaged, IntoManaged, ManagedReturn, ManagedValue, TypeOf};

/// Types whose members can be exposed through a management facade.
pub trait Managed: Sized + Send + Sync + 'static {
    /// Declare the managed members of this type
    fn declare(class: &mut ClassBuilder<Self>);

    /// Fully qualified type name used in descriptors and object names
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Stored callable for a managed method bound to `T`
pub type Invoker<T> =
    Arc<dyn Fn(&mut T, Vec<ManagedValue>) -> Result<ManagedValue, InvocationFault> + Send + Sync>;

/// Stored reader for a managed field
pub type FieldReader<T> = Arc<dyn Fn(&T) -> ManagedValue + Send + Sync>;

/// Stored writer for a managed field
pub type FieldWriter<T> = Arc<dyn Fn(&mut T, ManagedValue) -> Result<(), ConversionError> + Send + Sync>;

// ============================================================================
// Members
// ============================================================================

/// A declared managed field
pub struct FieldMember<T> {
    pub(crate) name: String,
    pub(crate) marker: ManagedMarker,
    pub(crate) value_type: ManagedType,
    pub(crate) declared_by: &'static str,
    pub(crate) read: FieldReader<T>,
    pub(crate) write: FieldWriter<T>,
}

impl<T> FieldMember<T> {
    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field marker
    pub fn marker(&self) -> &ManagedMarker {
        &self.marker
    }

    /// Field type
    pub fn value_type(&self) -> &ManagedType {
        &self.value_type
    }
}

/// A declared managed method, possibly inherited
pub struct MethodMember<T> {
    pub(crate) name: String,
    pub(crate) marker: ManagedMarker,
    pub(crate) parameter_types: Vec<ManagedType>,
    pub(crate) return_type: ManagedType,
    pub(crate) declared_by: &'static str,
    pub(crate) invoker: Invoker<T>,
}

impl<T: 'static> MethodMember<T> {
    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Method marker
    pub fn marker(&self) -> &ManagedMarker {
        &self.marker
    }

    /// Parameter types in declaration order
    pub fn parameter_types(&self) -> &[ManagedType] {
        &self.parameter_types
    }

    /// Return type
    pub fn return_type(&self) -> &ManagedType {
        &self.return_type
    }

    /// Name of the type that declared this method
    pub fn declared_by(&self) -> &'static str {
        self.declared_by
    }

    /// Rebind this method onto a child type through its upcast
    pub(crate) fn lift<C: 'static>(self, upcast: fn(&mut C) -> &mut T) -> MethodMember<C> {
        let inner = self.invoker;
        MethodMember {
            name: self.name,
            marker: self.marker,
            parameter_types: self.parameter_types,
            return_type: self.return_type,
            declared_by: self.declared_by,
            invoker: Arc::new(move |target: &mut C, args: Vec<ManagedValue>| {
                inner(upcast(target), args)
            }),
        }
    }
}

/// A declared constructor signature
#[derive(Debug, Clone)]
pub struct ConstructorMember {
    pub(crate) marker: ManagedMarker,
    pub(crate) parameter_types: Vec<ManagedType>,
}

/// Link from a type to its declared parent
pub(crate) struct ParentLink<T> {
    pub(crate) type_name: &'static str,
    pub(crate) inherit: Box<
        dyn Fn(&mut Vec<&'static str>) -> Result<Vec<MethodMember<T>>, DescriptorError> + Send + Sync,
    >,
}

// ============================================================================
// Class Builder
// ============================================================================

/// Collects the managed members of `T`.
pub struct ClassBuilder<T> {
    type_name: &'static str,
    pub(crate) fields: Vec<FieldMember<T>>,
    pub(crate) methods: Vec<MethodMember<T>>,
    pub(crate) constructors: Vec<ConstructorMember>,
    pub(crate) parent: Option<ParentLink<T>>,
    pub(crate) errors: Vec<DescriptorError>,
}

impl<T: Managed> ClassBuilder<T> {
    pub(crate) fn new() -> Self {
        ClassBuilder {
            type_name: T::type_name(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            parent: None,
            errors: Vec::new(),
        }
    }

    /// Name of the type being declared
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Declare a managed field backed by direct access.
    pub fn field<V>(
        &mut self,
        name: &str,
        marker: ManagedMarker,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> &mut Self
    where
        V: FromManaged + IntoManaged + TypeOf + Clone + Send + Sync + 'static,
    {
        if !self.check_name(name) {
            return self;
        }

        self.fields.push(FieldMember {
            name: name.to_string(),
            marker,
            value_type: V::managed_type(),
            declared_by: self.type_name,
            read: Arc::new(move |target: &T| get(target).clone().into_managed()),
            write: Arc::new(move |target: &mut T, value: ManagedValue| -> Result<(), ConversionError> {
                *get_mut(target) = V::from_managed(value)?;
                Ok(())
            }),
        });
        self
    }

    /// Declare a managed method.
    ///
    /// `f` takes `&mut T` followed by up to six typed arguments. Methods named
    /// like accessors (`getX`, `isX`, `setX`) may end up backing an attribute
    /// instead of an operation.
    pub fn method<Args, F>(&mut self, name: &str, marker: ManagedMarker, f: F) -> &mut Self
    where
        F: IntoMethod<T, Args>,
    {
        if !self.check_name(name) {
            return self;
        }

        self.methods.push(MethodMember {
            name: name.to_string(),
            marker,
            parameter_types: F::parameter_types(),
            return_type: F::return_type(),
            declared_by: self.type_name,
            invoker: f.into_invoker(),
        });
        self
    }

    /// Declare a constructor by its parameter tuple, e.g. `constructor::<(i32, String)>`.
    pub fn constructor<S: Signature>(&mut self, marker: ManagedMarker) -> &mut Self {
        self.constructors.push(ConstructorMember {
            marker,
            parameter_types: S::parameter_types(),
        });
        self
    }

    /// Declare the parent type whose managed methods `T` inherits.
    pub fn extends<P: Managed>(&mut self, upcast: fn(&mut T) -> &mut P) -> &mut Self {
        self.parent = Some(ParentLink {
            type_name: P::type_name(),
            inherit: Box::new(move |lineage: &mut Vec<&'static str>| -> Result<Vec<MethodMember<T>>, DescriptorError> {
                let parent = scanner::scan_lineage::<P>(lineage)?;
                Ok(parent
                    .methods
                    .into_iter()
                    .map(|method| method.lift(upcast))
                    .collect())
            }),
        });
        self
    }

    fn check_name(&mut self, name: &str) -> bool {
        if name.is_empty() {
            self.errors.push(DescriptorError::EmptyName {
                type_name: self.type_name.to_string(),
            });
            return false;
        }
        true
    }
}

// ============================================================================
// Typed Callables
// ============================================================================

/// Closures usable as managed methods on `T`.
///
/// Implemented for `Fn(&mut T, A1, .., An) -> R` with up to six arguments,
/// where every argument is [`FromManaged`] + [`TypeOf`] and the return type
/// is [`ManagedReturn`].
pub trait IntoMethod<T, Args>: Send + Sync + 'static {
    /// Declared parameter types
    fn parameter_types() -> Vec<ManagedType>;

    /// Declared return type
    fn return_type() -> ManagedType;

    /// Erase into a stored invoker
    fn into_invoker(self) -> Invoker<T>;
}

/// Parameter tuples describing a constructor.
pub trait Signature {
    /// Declared parameter types
    fn parameter_types() -> Vec<ManagedType>;
}

macro_rules! count_args {
    () => { 0usize };
    ($head:ident $($tail:ident)*) => { 1usize + count_args!($($tail)*) };
}

macro_rules! impl_callables {
    ($($arg:ident),*) => {
        impl<T, F, R, $($arg,)*> IntoMethod<T, ($($arg,)*)> for F
        where
            T: 'static,
            F: Fn(&mut T, $($arg),*) -> R + Send + Sync + 'static,
            R: ManagedReturn,
            $($arg: FromManaged + TypeOf,)*
        {
            fn parameter_types() -> Vec<ManagedType> {
                vec![$(<$arg as TypeOf>::managed_type()),*]
            }

            fn return_type() -> ManagedType {
                R::return_type()
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn into_invoker(self) -> Invoker<T> {
                Arc::new(
                    move |target: &mut T,
                          args: Vec<ManagedValue>|
                          -> Result<ManagedValue, InvocationFault> {
                        let expected = count_args!($($arg)*);
                        if args.len() != expected {
                            return Err(InvocationFault::Arity {
                                expected,
                                got: args.len(),
                            });
                        }
                        let mut args = args.into_iter();
                        $(
                            let $arg = <$arg as FromManaged>::from_managed(
                                args.next().unwrap_or(ManagedValue::Null),
                            )?;
                        )*
                        (self)(target, $($arg),*)
                            .into_return()
                            .map_err(InvocationFault::Failed)
                    },
                )
            }
        }

        impl<$($arg: TypeOf,)*> Signature for ($($arg,)*) {
            fn parameter_types() -> Vec<ManagedType> {
                vec![$(<$arg as TypeOf>::managed_type()),*]
            }
        }
    };
}

impl_callables!();
impl_callables!(A1);
impl_callables!(A1, A2);
impl_callables!(A1, A2, A3);
impl_callables!(A1, A2, A3, A4);
impl_callables!(A1, A2, A3, A4, A5);
impl_callables!(A1, A2, A3, A4, A5, A6);
