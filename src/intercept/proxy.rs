//! Interceptor proxy synthesis.
//!
//! Every intercepted component gets a proxy implementing the same
//! capabilities. Each method reachable through those capabilities carries
//! its effective interceptor list: a method-level list replaces the
//! class-level default, and a method whose effective list is empty forwards
//! straight to the real implementation.

use crate::core::{ComponentDescriptor, ComponentShape, DescriptorSet, InterceptionDecl, Lifetime};
use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Location};
use crate::extraction::expand_capabilities;
use crate::model::{MethodModel, ParameterModel, TypeRef, TypeSource};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// How a proxied call hands its result back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    /// Returns a value synchronously.
    Sync,
    /// Suspends; the awaited value is unwrapped before returning.
    Async,
    /// Returns nothing.
    Unit,
}

impl CallKind {
    pub fn of(method: &MethodModel) -> Self {
        match (method.is_async, &method.returns) {
            (true, _) => CallKind::Async,
            (false, Some(_)) => CallKind::Sync,
            (false, None) => CallKind::Unit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxyMethod {
    pub name: String,
    /// Capability that declares the method.
    pub capability: String,
    pub parameters: Vec<ParameterModel>,
    pub returns: Option<TypeRef>,
    pub call_kind: CallKind,
    /// Effective interceptors, outermost first. Empty means forwarded.
    pub interceptors: Vec<String>,
}

impl ProxyMethod {
    pub fn is_wrapped(&self) -> bool {
        !self.interceptors.is_empty()
    }
}

/// One row of the proxy table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxyDescriptor {
    pub identity: String,
    /// The intercepted component.
    pub target: String,
    pub module: String,
    pub capabilities: Vec<String>,
    pub lifetime: Lifetime,
    pub methods: Vec<ProxyMethod>,
}

impl ProxyDescriptor {
    pub fn wrapped_methods(&self) -> impl Iterator<Item = &ProxyMethod> {
        self.methods.iter().filter(|m| m.is_wrapped())
    }

    /// Whether another capability of this proxy declares a method with the
    /// same name, so calls on the target must name the capability.
    pub fn shares_name(&self, method: &ProxyMethod) -> bool {
        self.methods
            .iter()
            .any(|m| m.name == method.name && m.capability != method.capability)
    }
}

/// `OrdersProxy` for `Orders`, `CacheProxy<User>` for `Cache<User>`.
pub fn proxy_identity(target: &TypeRef) -> String {
    TypeRef::generic(format!("{}Proxy", target.name), target.args.clone()).to_string()
}

/// Methods reachable through `capabilities`, with capability type arguments
/// substituted. Methods are keyed by capability and name, so two
/// capabilities declaring the same name each keep their own signature.
pub fn reachable_methods<S: TypeSource>(
    source: &S,
    capabilities: &[TypeRef],
) -> Vec<(TypeRef, MethodModel)> {
    let mut seen = BTreeSet::new();
    let mut methods = Vec::new();

    for capability in expand_capabilities(source, capabilities) {
        let Some(model) = source.find_capability(&capability.name) else {
            continue;
        };
        let bindings: BTreeMap<String, TypeRef> = model
            .type_parameters
            .iter()
            .cloned()
            .zip(capability.args.iter().cloned())
            .collect();
        for method in &model.methods {
            if !seen.insert((capability.to_string(), method.name.clone())) {
                continue;
            }
            let closed = MethodModel {
                name: method.name.clone(),
                parameters: method
                    .parameters
                    .iter()
                    .map(|p| ParameterModel {
                        name: p.name.clone(),
                        ty: p.ty.substitute(&bindings),
                        key: p.key.clone(),
                    })
                    .collect(),
                returns: method.returns.as_ref().map(|r| r.substitute(&bindings)),
                is_async: method.is_async,
            };
            methods.push((capability.clone(), closed));
        }
    }

    methods
}

/// Build a proxy for every intercepted descriptor in `set`.
pub fn synthesize_proxies<S: TypeSource>(
    source: &S,
    set: &DescriptorSet,
    diagnostics: &mut Diagnostics,
) -> Vec<ProxyDescriptor> {
    let mut proxies = Vec::new();
    for (_, descriptor) in set.iter() {
        let ComponentShape::Intercepted { interception } = &descriptor.shape else {
            continue;
        };
        if let Some(proxy) = synthesize(source, set, descriptor, interception, diagnostics) {
            proxies.push(proxy);
        }
    }
    proxies
}

fn synthesize<S: TypeSource>(
    source: &S,
    set: &DescriptorSet,
    descriptor: &ComponentDescriptor,
    interception: &InterceptionDecl,
    diagnostics: &mut Diagnostics,
) -> Option<ProxyDescriptor> {
    let location = Location::new(&descriptor.origin, &descriptor.identity);
    let resolve = |list: &[TypeRef]| -> Vec<String> {
        list.iter()
            .map(|i| i.to_string())
            .filter(|identity| set.find(identity).is_some())
            .collect()
    };

    let mentioned: BTreeSet<String> = interception
        .class_level
        .iter()
        .chain(interception.per_method.values().flatten())
        .map(|i| i.to_string())
        .collect();
    for interceptor in mentioned.iter().filter(|i| set.find(i).is_none()) {
        diagnostics.push(
            Diagnostic::structural(
                DiagnosticCode::UNRESOLVED_INTERCEPTOR,
                format!(
                    "`{}` is intercepted by `{}`, which is not a registered component",
                    descriptor.identity, interceptor
                ),
            )
            .at(location.clone())
            .involving([descriptor.identity.clone(), interceptor.clone()]),
        );
    }

    let class_level = resolve(&interception.class_level);
    let reachable = reachable_methods(source, &descriptor.capabilities);

    for method in interception.per_method.keys() {
        if !reachable.iter().any(|(_, m)| m.name == *method) {
            diagnostics.push(
                Diagnostic::info(
                    DiagnosticCode::ORPHANED_ATTRIBUTE,
                    format!(
                        "`intercept_method` names `{}`, which no capability of `{}` declares",
                        method, descriptor.identity
                    ),
                )
                .at(location.clone().with_member(method))
                .involving([descriptor.identity.clone()]),
            );
        }
    }

    let methods: Vec<ProxyMethod> = reachable
        .into_iter()
        .map(|(capability, method)| {
            let interceptors = match interception.per_method.get(&method.name) {
                Some(overridden) => resolve(overridden),
                None => class_level.clone(),
            };
            ProxyMethod {
                call_kind: CallKind::of(&method),
                name: method.name,
                capability: capability.to_string(),
                parameters: method.parameters,
                returns: method.returns,
                interceptors,
            }
        })
        .collect();

    if !methods.iter().any(ProxyMethod::is_wrapped) {
        diagnostics.push(
            Diagnostic::info(
                DiagnosticCode::ORPHANED_ATTRIBUTE,
                format!(
                    "`{}` is marked for interception but exposes no method to wrap",
                    descriptor.identity
                ),
            )
            .at(location)
            .involving([descriptor.identity.clone()]),
        );
        return None;
    }

    let proxy = ProxyDescriptor {
        identity: proxy_identity(&descriptor.type_ref),
        target: descriptor.identity.clone(),
        module: descriptor.origin.clone(),
        capabilities: descriptor.capabilities.iter().map(|c| c.to_string()).collect(),
        lifetime: descriptor.lifetime,
        methods,
    };
    tracing::debug!(
        proxy = %proxy.identity,
        wrapped = proxy.wrapped_methods().count(),
        forwarded = proxy.methods.len() - proxy.wrapped_methods().count(),
        "proxy synthesized"
    );
    Some(proxy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::descriptor;
    use crate::model::{CapabilityModel, ModuleModel, TypeUniverse};
    use pretty_assertions::assert_eq;

    fn method(name: &str, returns: Option<&str>, is_async: bool) -> MethodModel {
        MethodModel {
            name: name.into(),
            parameters: vec![ParameterModel {
                name: "id".into(),
                ty: TypeRef::simple("u64"),
                key: None,
            }],
            returns: returns.map(|r| TypeRef::parse(r).unwrap()),
            is_async,
        }
    }

    fn universe() -> TypeUniverse {
        TypeUniverse::new(
            "app",
            vec![ModuleModel {
                name: "app".into(),
                capabilities: vec![
                    CapabilityModel {
                        name: "Reader".into(),
                        type_parameters: vec!["T".into()],
                        extends: vec![],
                        methods: vec![method("read", Some("T"), true)],
                    },
                    CapabilityModel {
                        name: "OrderService".into(),
                        type_parameters: vec![],
                        extends: vec![TypeRef::parse("Reader<Order>").unwrap()],
                        methods: vec![
                            method("place", Some("Receipt"), false),
                            method("ping", None, false),
                        ],
                    },
                ],
                ..Default::default()
            }],
        )
    }

    fn intercepted(class_level: &[&str], per_method: &[(&str, &[&str])]) -> ComponentDescriptor {
        let mut d = descriptor("Orders", Lifetime::Scoped);
        d.capabilities.push(TypeRef::simple("OrderService"));
        d.shape = ComponentShape::Intercepted {
            interception: InterceptionDecl {
                class_level: class_level.iter().map(|i| TypeRef::simple(*i)).collect(),
                per_method: per_method
                    .iter()
                    .map(|(m, list)| {
                        (m.to_string(), list.iter().map(|i| TypeRef::simple(*i)).collect())
                    })
                    .collect(),
            },
        };
        d
    }

    fn interceptors(proxy: &ProxyDescriptor) -> Vec<(String, Vec<String>)> {
        proxy
            .methods
            .iter()
            .map(|m| (m.name.clone(), m.interceptors.clone()))
            .collect()
    }

    #[test]
    fn test_method_override_replaces_class_level() {
        let set = DescriptorSet::new(vec![
            descriptor("Audit", Lifetime::Singleton),
            descriptor("Timing", Lifetime::Singleton),
            descriptor("Cache", Lifetime::Singleton),
            intercepted(&["Audit", "Timing"], &[("read", &["Cache"]), ("ping", &[])]),
        ]);
        let mut diagnostics = Diagnostics::new();
        let proxies = synthesize_proxies(&universe(), &set, &mut diagnostics);

        assert!(diagnostics.is_empty());
        assert_eq!(proxies.len(), 1);
        let proxy = &proxies[0];
        assert_eq!(proxy.identity, "OrdersProxy");
        assert_eq!(
            interceptors(proxy),
            vec![
                ("place".to_string(), vec!["Audit".to_string(), "Timing".to_string()]),
                ("ping".to_string(), vec![]),
                ("read".to_string(), vec!["Cache".to_string()]),
            ]
        );
        assert_eq!(proxy.wrapped_methods().count(), 2);
    }

    #[test]
    fn test_inherited_method_is_specialized() {
        let set = DescriptorSet::new(vec![
            descriptor("Audit", Lifetime::Singleton),
            intercepted(&["Audit"], &[]),
        ]);
        let proxies = synthesize_proxies(&universe(), &set, &mut Diagnostics::new());
        let read = proxies[0].methods.iter().find(|m| m.name == "read").unwrap();
        assert_eq!(read.capability, "Reader<Order>");
        assert_eq!(read.returns, Some(TypeRef::simple("Order")));
        assert_eq!(read.call_kind, CallKind::Async);

        let ping = proxies[0].methods.iter().find(|m| m.name == "ping").unwrap();
        assert_eq!(ping.call_kind, CallKind::Unit);
    }

    #[test]
    fn test_unknown_interceptor_is_structural() {
        let set = DescriptorSet::new(vec![
            descriptor("Audit", Lifetime::Singleton),
            intercepted(&["Audit", "Missing"], &[]),
        ]);
        let mut diagnostics = Diagnostics::new();
        let proxies = synthesize_proxies(&universe(), &set, &mut diagnostics);

        assert!(diagnostics.has_errors());
        assert_eq!(
            diagnostics
                .with_code(DiagnosticCode::UNRESOLVED_INTERCEPTOR)
                .count(),
            1
        );
        assert!(proxies[0].methods.iter().all(|m| m.interceptors == vec!["Audit"]));
    }

    #[test]
    fn test_nothing_to_wrap_is_orphaned() {
        let set = DescriptorSet::new(vec![
            descriptor("Audit", Lifetime::Singleton),
            intercepted(&[], &[("place", &["Audit"]), ("refund", &["Audit"])]),
        ]);
        let mut diagnostics = Diagnostics::new();
        let proxies = synthesize_proxies(&TypeUniverse::new("app", vec![]), &set, &mut diagnostics);

        assert!(proxies.is_empty());
        assert_eq!(diagnostics.with_code(DiagnosticCode::ORPHANED_ATTRIBUTE).count(), 3);
    }

    #[test]
    fn test_proxy_identity_keeps_type_arguments() {
        assert_eq!(proxy_identity(&TypeRef::simple("Orders")), "OrdersProxy");
        assert_eq!(
            proxy_identity(&TypeRef::parse("Cache<User>").unwrap()),
            "CacheProxy<User>"
        );
    }

    #[test]
    fn test_same_method_name_on_two_capabilities_keeps_both() {
        let universe = TypeUniverse::new(
            "app",
            vec![ModuleModel {
                name: "app".into(),
                capabilities: vec![
                    CapabilityModel {
                        name: "OrderService".into(),
                        type_parameters: vec![],
                        extends: vec![],
                        methods: vec![method("close", Some("Receipt"), false)],
                    },
                    CapabilityModel {
                        name: "Session".into(),
                        type_parameters: vec![],
                        extends: vec![],
                        methods: vec![MethodModel {
                            name: "close".into(),
                            parameters: vec![],
                            returns: None,
                            is_async: true,
                        }],
                    },
                ],
                ..Default::default()
            }],
        );
        let mut orders = intercepted(&["Audit"], &[]);
        orders.capabilities.push(TypeRef::simple("Session"));
        let set = DescriptorSet::new(vec![descriptor("Audit", Lifetime::Singleton), orders]);
        let proxies = synthesize_proxies(&universe, &set, &mut Diagnostics::new());

        let proxy = &proxies[0];
        let closes: Vec<(&str, CallKind, usize)> = proxy
            .methods
            .iter()
            .map(|m| (m.capability.as_str(), m.call_kind, m.parameters.len()))
            .collect();
        assert_eq!(
            closes,
            vec![("OrderService", CallKind::Sync, 1), ("Session", CallKind::Async, 0)]
        );
        assert!(proxy.methods.iter().all(|m| proxy.shares_name(m)));
    }
}
