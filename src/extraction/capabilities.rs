//! Capability hierarchy and the capability universe.

use crate::config::WiremapConfig;
use crate::model::{Attribute, TypeModel, TypeRef, TypeSource};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Name of the capability a generated factory is resolved as.
pub fn factory_capability_name(target: &TypeRef) -> String {
    format!("{}Factory", target.name)
}

/// Every capability name that can be injected in this compilation.
///
/// A parameter type is injectable only if it names something in here:
/// a capability some module declares, a capability some candidate type
/// provides, or the generated factory of a factory-marked type.
#[derive(Debug, Clone, Default)]
pub struct CapabilityUniverse {
    concrete: BTreeSet<TypeRef>,
    declared: BTreeSet<String>,
}

impl CapabilityUniverse {
    /// Pre-pass over the whole type source.
    pub fn scan<S: TypeSource>(source: &S, config: &WiremapConfig) -> Self {
        let mut universe = Self::default();

        for module in source.modules() {
            for capability in &module.capabilities {
                if !config.is_ignored_capability(&capability.name) {
                    universe.declared.insert(capability.name.clone());
                }
            }
        }

        for module in source.modules() {
            for ty in module.types.iter().filter(|t| is_candidate(t)) {
                if ty.is_open_generic() {
                    universe.declared.insert(ty.name.clone());
                    continue;
                }
                universe.concrete.insert(ty.self_ref());
                for capability in expand_capabilities(source, &ty.implements) {
                    if !config.is_ignored_capability(&capability.name) {
                        universe.concrete.insert(capability);
                    }
                }
                if ty
                    .attributes
                    .iter()
                    .any(|a| matches!(a, Attribute::GenerateFactory))
                {
                    universe
                        .concrete
                        .insert(TypeRef::simple(factory_capability_name(&ty.self_ref())));
                }
            }
        }

        universe
    }

    pub fn contains(&self, ty: &TypeRef) -> bool {
        self.concrete.contains(ty) || self.declared.contains(&ty.name)
    }

    /// Add a capability discovered after the pre-pass.
    pub fn insert(&mut self, ty: TypeRef) {
        self.concrete.insert(ty);
    }

    pub fn len(&self) -> usize {
        self.concrete.len() + self.declared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn is_candidate(ty: &TypeModel) -> bool {
    !ty.is_abstract && !ty.attributes.iter().any(|a| matches!(a, Attribute::Exclude))
}

/// Close `implements` over declared `extends` relationships.
///
/// Type arguments flow from each implemented reference into the capability's
/// parameters, so `Repository<User>` extending `Reader<T>` yields
/// `Reader<User>`. Order is breadth-first from the declaration order, with
/// duplicates removed.
pub fn expand_capabilities<S: TypeSource>(source: &S, implements: &[TypeRef]) -> Vec<TypeRef> {
    let mut seen = BTreeSet::new();
    let mut ordered = Vec::new();
    let mut queue: VecDeque<TypeRef> = implements.iter().cloned().collect();

    while let Some(capability) = queue.pop_front() {
        if !seen.insert(capability.clone()) {
            continue;
        }
        if let Some(model) = source.find_capability(&capability.name) {
            let bindings: BTreeMap<String, TypeRef> = model
                .type_parameters
                .iter()
                .cloned()
                .zip(capability.args.iter().cloned())
                .collect();
            queue.extend(model.extends.iter().map(|e| e.substitute(&bindings)));
        }
        ordered.push(capability);
    }

    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CapabilityModel, ModuleModel, TypeUniverse};

    fn universe() -> TypeUniverse {
        let module = ModuleModel {
            name: "app".into(),
            capabilities: vec![
                CapabilityModel {
                    name: "Repository".into(),
                    type_parameters: vec!["T".into()],
                    extends: vec![
                        TypeRef::parse("Reader<T>").unwrap(),
                        TypeRef::simple("Disposable"),
                    ],
                    methods: vec![],
                },
                CapabilityModel {
                    name: "Reader".into(),
                    type_parameters: vec!["T".into()],
                    ..Default::default()
                },
            ],
            types: vec![TypeModel {
                name: "UserRepo".into(),
                accessibility: Default::default(),
                is_abstract: false,
                type_parameters: vec![],
                implements: vec![TypeRef::parse("Repository<User>").unwrap()],
                attributes: vec![Attribute::GenerateFactory],
                constructors: vec![],
            }],
            ..Default::default()
        };
        TypeUniverse::new("app", vec![module])
    }

    #[test]
    fn test_expand_substitutes_type_arguments() {
        let source = universe();
        let expanded =
            expand_capabilities(&source, &[TypeRef::parse("Repository<User>").unwrap()]);
        let names: Vec<String> = expanded.iter().map(|c| c.to_string()).collect();
        assert_eq!(names, vec!["Repository<User>", "Reader<User>", "Disposable"]);
    }

    #[test]
    fn test_scan_collects_concrete_and_factory_capabilities() {
        let source = universe();
        let capabilities = CapabilityUniverse::scan(&source, &WiremapConfig::default());
        assert!(capabilities.contains(&TypeRef::parse("Reader<User>").unwrap()));
        assert!(capabilities.contains(&TypeRef::simple("UserRepoFactory")));
        assert!(capabilities.contains(&TypeRef::simple("UserRepo")));
        // declared generic capabilities match any specialization
        assert!(capabilities.contains(&TypeRef::parse("Repository<Order>").unwrap()));
        assert!(!capabilities.contains(&TypeRef::simple("Disposable")));
    }
}
