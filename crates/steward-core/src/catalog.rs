//! Operation Catalog
//!
//! Every marked method that the binder did not claim as an accessor becomes
//! an operation. Overloads are kept side by side in scan order and are only
//! told apart at invocation time by their parameter types.

use crate::binder::is_accessor;
use crate::class::{ConstructorMember, Invoker, MethodMember};
use crate::descriptor::{ConstructorDescriptor, OperationDescriptor};

/// Operation descriptors with their invokers at matching indices
pub struct OperationTable<T> {
    pub descriptors: Vec<OperationDescriptor>,
    pub invokers: Vec<Invoker<T>>,
}

/// Catalog the non-accessor methods, in scan order
pub fn catalog<T: 'static>(methods: &[MethodMember<T>]) -> OperationTable<T> {
    let (descriptors, invokers) = methods
        .iter()
        .filter(|method| !is_accessor(*method))
        .map(|method| {
            let descriptor = OperationDescriptor {
                name: method.name().to_string(),
                description: method.marker().description.clone(),
                parameter_types: method.parameter_types().to_vec(),
                return_type: method.return_type().clone(),
                declared_by: method.declared_by().to_string(),
            };
            (descriptor, method.invoker.clone())
        })
        .unzip();

    OperationTable {
        descriptors,
        invokers,
    }
}

/// Describe declared constructors; informational only
pub fn describe_constructors(constructors: &[ConstructorMember]) -> Vec<ConstructorDescriptor> {
    constructors
        .iter()
        .map(|ctor| ConstructorDescriptor {
            description: ctor.marker.description.clone(),
            parameter_types: ctor.parameter_types.clone(),
        })
        .collect()
}
