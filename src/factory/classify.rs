//! Injectable vs. runtime-supplied parameter classification.

use crate::config::WiremapConfig;
use crate::core::{ClassifiedParameter, DependencyKind, DependencyRef, ParameterClass};
use crate::extraction::CapabilityUniverse;
use crate::model::{ParameterModel, TypeRef};
use std::collections::BTreeMap;

/// Value types that are always supplied by the caller.
const VALUE_TYPES: &[&str] = &[
    "bool", "char", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64",
    "u128", "usize", "f32", "f64", "String", "str",
];

const CALLABLE_TYPES: &[&str] = &["Fn", "FnMut", "FnOnce"];

pub struct ParameterClassifier<'a> {
    config: &'a WiremapConfig,
    capabilities: &'a CapabilityUniverse,
}

impl<'a> ParameterClassifier<'a> {
    pub fn new(config: &'a WiremapConfig, capabilities: &'a CapabilityUniverse) -> Self {
        Self {
            config,
            capabilities,
        }
    }

    /// Classify one constructor parameter after substituting `bindings`.
    pub fn classify(
        &self,
        position: usize,
        parameter: &ParameterModel,
        bindings: &BTreeMap<String, TypeRef>,
    ) -> ClassifiedParameter {
        let ty = parameter.ty.substitute(bindings);
        let class = match self.injection_of(&ty) {
            Some((capability, kind)) => ParameterClass::Injectable {
                dependency: DependencyRef {
                    position,
                    parameter: parameter.name.clone(),
                    declared: ty.clone(),
                    capability,
                    key: parameter.key.clone(),
                    kind,
                },
            },
            None => ParameterClass::RuntimeSupplied,
        };
        ClassifiedParameter {
            name: parameter.name.clone(),
            ty,
            class,
        }
    }

    fn injection_of(&self, ty: &TypeRef) -> Option<(TypeRef, DependencyKind)> {
        if is_runtime_type(ty) {
            return None;
        }
        if let Some(inner) = ty.single_arg() {
            if self.config.is_collection_wrapper(&ty.name) {
                return self
                    .is_capability(inner)
                    .then(|| (inner.clone(), DependencyKind::Collection));
            }
            if self.config.is_deferred_wrapper(&ty.name) {
                return self
                    .is_capability(inner)
                    .then(|| (inner.clone(), DependencyKind::Deferred));
            }
        }
        self.is_capability(ty)
            .then(|| (ty.clone(), DependencyKind::Single))
    }

    fn is_capability(&self, ty: &TypeRef) -> bool {
        !is_runtime_type(ty) && self.capabilities.contains(ty)
    }
}

/// Pure function: primitives, text, callables and arrays are never injected.
pub fn is_runtime_type(ty: &TypeRef) -> bool {
    ty.is_array()
        || VALUE_TYPES.contains(&ty.name.as_str())
        || CALLABLE_TYPES.contains(&ty.name.as_str())
}
