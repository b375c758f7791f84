//! The registration plan handed to the runtime container.

use crate::core::{
    ComponentDescriptor, ComponentShape, DependencyKind, DependencyRef, DescriptorSet, Lifetime,
    ParameterClass, Synthesis,
};
use crate::decorators::DecoratorGroup;
use crate::factory::FactoryDescriptor;
use crate::intercept::{proxy_identity, ProxyDescriptor};
use crate::model::TypeRef;
use serde::Serialize;
use std::collections::BTreeMap;

/// One row of the registration table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub module: String,
    pub identity: String,
    pub capabilities: Vec<String>,
    pub lifetime: Lifetime,
    /// Expression the container evaluates against its resolution context.
    pub construction: String,
    pub service_keys: Vec<String>,
    pub shape: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionsBinding {
    pub module: String,
    pub identity: String,
    pub section: String,
}

/// Every table one module contributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistrationPlan {
    pub registrations: Vec<Registration>,
    pub decorators: Vec<DecoratorGroup>,
    pub factories: Vec<FactoryDescriptor>,
    pub proxies: Vec<ProxyDescriptor>,
    /// Managed background components, started and stopped by the host.
    pub hosted: Vec<String>,
    pub options: Vec<OptionsBinding>,
}

impl RegistrationPlan {
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
            && self.decorators.is_empty()
            && self.factories.is_empty()
            && self.proxies.is_empty()
    }

    pub fn registration(&self, identity: &str) -> Option<&Registration> {
        self.registrations.iter().find(|r| r.identity == identity)
    }

    /// Keep only the rows contributed by `module`.
    ///
    /// Referenced modules ship their own plans; the registry merges them.
    pub fn retain_module(&mut self, module: &str) {
        self.registrations.retain(|r| r.module == module);
        self.factories.retain(|f| f.module == module);
        self.proxies.retain(|p| p.module == module);
        self.options.retain(|o| o.module == module);
        for group in &mut self.decorators {
            group.retain_module(module);
        }
        self.decorators.retain(|g| !g.decorators.is_empty());
        let registrations = &self.registrations;
        self.hosted
            .retain(|h| registrations.iter().any(|r| r.identity == *h));
    }

    /// Restore the canonical (module, identity) order of every table.
    pub fn sort(&mut self) {
        self.registrations
            .sort_by(|a, b| (&a.module, &a.identity).cmp(&(&b.module, &b.identity)));
        self.factories
            .sort_by(|a, b| (&a.module, &a.identity).cmp(&(&b.module, &b.identity)));
        self.proxies
            .sort_by(|a, b| (&a.module, &a.identity).cmp(&(&b.module, &b.identity)));
        self.options
            .sort_by(|a, b| (&a.module, &a.identity).cmp(&(&b.module, &b.identity)));
        self.decorators.sort_by(|a, b| a.capability.cmp(&b.capability));
        let hosted = std::mem::take(&mut self.hosted);
        self.hosted = self
            .registrations
            .iter()
            .filter(|r| hosted.contains(&r.identity))
            .map(|r| r.identity.clone())
            .collect();
    }
}

/// `Clock` stays as is; `Cache<User>` becomes `<Cache<User>>` so it can
/// start a path expression.
pub fn type_path(ty: &TypeRef) -> String {
    if ty.args.is_empty() {
        ty.name.clone()
    } else {
        format!("<{}>", ty)
    }
}

fn resolution_expression(dependency: &DependencyRef) -> String {
    let (method, ty) = match dependency.kind {
        DependencyKind::Single => ("resolve", &dependency.capability),
        DependencyKind::Collection => ("resolve_all", &dependency.capability),
        DependencyKind::Deferred => ("deferred", &dependency.declared),
    };
    match &dependency.key {
        Some(key) => format!("ctx.{}_keyed::<{}>({:?})", method, ty, key),
        None => format!("ctx.{}::<{}>()", method, ty),
    }
}

fn constructor_call(descriptor: &ComponentDescriptor, inner_slots: &[usize]) -> String {
    let arguments: Vec<String> = descriptor
        .constructor
        .iter()
        .enumerate()
        .map(|(position, parameter)| {
            if inner_slots.contains(&position) {
                return "inner".to_string();
            }
            match &parameter.class {
                ParameterClass::Injectable { dependency } => resolution_expression(dependency),
                ParameterClass::RuntimeSupplied => "Default::default()".to_string(),
            }
        })
        .collect();
    format!("{}::new({})", type_path(&descriptor.type_ref), arguments.join(", "))
}

/// The construction expression for one registered descriptor.
pub fn construction_expression(descriptor: &ComponentDescriptor, proxied: bool) -> String {
    if let Some(Synthesis::Factory { .. }) = &descriptor.synthesized {
        return format!("{}::new(ctx.clone())", type_path(&descriptor.type_ref));
    }
    match &descriptor.shape {
        ComponentShape::Decorator { decorates } => {
            let slots: Vec<usize> = decorates.iter().map(|d| d.inner_position).collect();
            constructor_call(descriptor, &slots)
        }
        ComponentShape::Intercepted { .. } if proxied => {
            let proxy = TypeRef::generic(
                format!("{}Proxy", descriptor.type_ref.name),
                descriptor.type_ref.args.clone(),
            );
            format!(
                "{}::new({}, ctx)",
                type_path(&proxy),
                constructor_call(descriptor, &[])
            )
        }
        ComponentShape::Options { section } => {
            format!("ctx.options::<{}>({:?})", descriptor.type_ref, section)
        }
        _ => constructor_call(descriptor, &[]),
    }
}

fn registration(descriptor: &ComponentDescriptor, proxied: bool) -> Registration {
    let capabilities = match &descriptor.shape {
        ComponentShape::Decorator { decorates } => descriptor
            .capabilities
            .iter()
            .filter(|c| !decorates.iter().any(|d| d.target == **c))
            .map(|c| c.to_string())
            .collect(),
        _ => descriptor.capabilities.iter().map(|c| c.to_string()).collect(),
    };
    Registration {
        module: descriptor.origin.clone(),
        identity: descriptor.identity.clone(),
        capabilities,
        lifetime: descriptor.lifetime,
        construction: construction_expression(descriptor, proxied),
        service_keys: descriptor.service_keys.clone(),
        shape: descriptor.shape.tag().to_string(),
    }
}

/// Assemble the plan from every derived artifact.
///
/// Factory-marked descriptors with runtime-supplied parameters are left out
/// of the registration table; their generated factories are in it instead.
/// A factory-marked descriptor with no runtime parameters is registered
/// directly alongside its factory.
pub fn build_plan(
    set: &DescriptorSet,
    decorators: Vec<DecoratorGroup>,
    factories: Vec<FactoryDescriptor>,
    proxies: Vec<ProxyDescriptor>,
) -> RegistrationPlan {
    let proxied: BTreeMap<&str, &ProxyDescriptor> =
        proxies.iter().map(|p| (p.target.as_str(), p)).collect();

    let mut plan = RegistrationPlan::default();
    for (_, descriptor) in set.iter() {
        if descriptor.shape.is_excluded_factory() {
            continue;
        }
        let is_proxied = proxied
            .get(descriptor.identity.as_str())
            .is_some_and(|p| p.identity == proxy_identity(&descriptor.type_ref));
        plan.registrations.push(registration(descriptor, is_proxied));

        if descriptor.hosted {
            plan.hosted.push(descriptor.identity.clone());
        }
        if let ComponentShape::Options { section } = &descriptor.shape {
            plan.options.push(OptionsBinding {
                module: descriptor.origin.clone(),
                identity: descriptor.identity.clone(),
                section: section.clone(),
            });
        }
    }

    plan.decorators = decorators;
    plan.factories = factories;
    plan.proxies = proxies;
    plan.sort();
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{depends_on, descriptor};
    use crate::core::{DecoratorDecl, InterceptionDecl};
    use crate::intercept::{CallKind, ProxyMethod};

    #[test]
    fn test_construction_resolves_each_parameter() {
        let mut report = depends_on(
            depends_on(
                depends_on(
                    descriptor("Report", Lifetime::Singleton),
                    "Clock",
                    DependencyKind::Single,
                ),
                "Handler",
                DependencyKind::Collection,
            ),
            "Mailer",
            DependencyKind::Deferred,
        );
        if let ParameterClass::Injectable { dependency } = &mut report.constructor[0].class {
            dependency.key = Some("utc".into());
        }
        assert_eq!(
            construction_expression(&report, false),
            "Report::new(ctx.resolve_keyed::<Clock>(\"utc\"), ctx.resolve_all::<Handler>(), ctx.deferred::<Lazy<Mailer>>())"
        );
    }

    #[test]
    fn test_generic_type_uses_qualified_path() {
        let mut cache = descriptor("Cache<User>", Lifetime::Singleton);
        cache.type_ref = TypeRef::parse("Cache<User>").unwrap();
        assert_eq!(construction_expression(&cache, false), "<Cache<User>>::new()");
    }

    #[test]
    fn test_decorator_inner_slot_and_capabilities() {
        let mut logging = depends_on(
            descriptor("LoggingRepo", Lifetime::Singleton),
            "Repo",
            DependencyKind::Single,
        );
        logging.capabilities.push(TypeRef::simple("Repo"));
        logging.shape = ComponentShape::Decorator {
            decorates: vec![DecoratorDecl {
                target: TypeRef::simple("Repo"),
                order: 0,
                inner_position: 0,
            }],
        };
        let row = registration(&logging, false);
        assert_eq!(row.construction, "LoggingRepo::new(inner)");
        assert_eq!(row.capabilities, vec!["LoggingRepo"]);
        assert_eq!(row.shape, "decorator");
    }

    #[test]
    fn test_plan_orders_by_module_then_identity() {
        let mut zeta = descriptor("Alpha", Lifetime::Singleton);
        zeta.origin = "zeta".into();
        let mut hosted = descriptor("Worker", Lifetime::Singleton);
        hosted.hosted = true;
        let set = DescriptorSet::new(vec![zeta, descriptor("Beta", Lifetime::Scoped), hosted]);

        let plan = build_plan(&set, vec![], vec![], vec![]);
        let order: Vec<(&str, &str)> = plan
            .registrations
            .iter()
            .map(|r| (r.module.as_str(), r.identity.as_str()))
            .collect();
        assert_eq!(order, vec![("app", "Beta"), ("app", "Worker"), ("zeta", "Alpha")]);
        assert_eq!(plan.hosted, vec!["Worker"]);
    }

    #[test]
    fn test_intercepted_registration_goes_through_proxy() {
        let mut orders = descriptor("Orders", Lifetime::Scoped);
        orders.shape = ComponentShape::Intercepted {
            interception: InterceptionDecl::default(),
        };
        let set = DescriptorSet::new(vec![orders]);
        let proxy = ProxyDescriptor {
            identity: "OrdersProxy".into(),
            target: "Orders".into(),
            module: "app".into(),
            capabilities: vec!["Orders".into()],
            lifetime: Lifetime::Scoped,
            methods: vec![ProxyMethod {
                name: "place".into(),
                capability: "Orders".into(),
                parameters: vec![],
                returns: None,
                call_kind: CallKind::Unit,
                interceptors: vec!["Audit".into()],
            }],
        };
        let plan = build_plan(&set, vec![], vec![], vec![proxy]);
        assert_eq!(
            plan.registrations[0].construction,
            "OrdersProxy::new(Orders::new(), ctx)"
        );
    }

    #[test]
    fn test_retain_module_drops_referenced_rows() {
        let mut shared = descriptor("Clock", Lifetime::Singleton);
        shared.origin = "infra".into();
        shared.hosted = true;
        let set = DescriptorSet::new(vec![shared, descriptor("Report", Lifetime::Scoped)]);

        let mut plan = build_plan(&set, vec![], vec![], vec![]);
        plan.retain_module("app");
        assert_eq!(plan.registrations.len(), 1);
        assert_eq!(plan.registrations[0].identity, "Report");
        assert!(plan.hosted.is_empty());
    }

    #[test]
    fn test_options_binding_recorded() {
        let mut settings = descriptor("SmtpSettings", Lifetime::Singleton);
        settings.shape = ComponentShape::Options {
            section: "smtp".into(),
        };
        let plan = build_plan(&DescriptorSet::new(vec![settings]), vec![], vec![], vec![]);
        assert_eq!(
            plan.registrations[0].construction,
            "ctx.options::<SmtpSettings>(\"smtp\")"
        );
        assert_eq!(plan.options[0].section, "smtp");
    }
}
