//! Generated Rust source fragments.
//!
//! The text is a pure function of the plan: the same plan always renders to
//! the same bytes. The fragments target the runtime container collaborator
//! (`ContainerBuilder`, `ResolutionContext`) and the interception runtime in
//! [`crate::intercept::runtime`].

use super::plan::{type_path, RegistrationPlan};
use crate::core::DependencyKind;
use crate::factory::{CreationMethod, FactoryDescriptor};
use crate::intercept::{CallKind, ProxyDescriptor, ProxyMethod};
use crate::model::TypeRef;
use serde::Serialize;
use std::collections::BTreeMap;

pub const GENERATED_HEADER: &str = "// @generated by wiremap";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedSource {
    pub path: String,
    pub contents: String,
}

#[derive(Default)]
struct SourceBuilder {
    out: String,
    indent: usize,
}

impl SourceBuilder {
    fn new(module: &str) -> Self {
        let mut builder = Self::default();
        builder.line(GENERATED_HEADER);
        builder.line(format!("// module: {}", module));
        builder.blank();
        builder
    }

    fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn open(&mut self, text: impl AsRef<str>) {
        self.line(text);
        self.indent += 1;
    }

    fn close(&mut self, text: impl AsRef<str>) {
        self.indent = self.indent.saturating_sub(1);
        self.line(text);
    }

    fn finish(self, path: &str) -> GeneratedSource {
        GeneratedSource {
            path: path.to_string(),
            contents: self.out,
        }
    }
}

fn quoted_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|i| format!("{:?}", i)).collect();
    format!("&[{}]", quoted.join(", "))
}

/// Render `registrations.rs`, `factories.rs` and `proxies.rs` for `module`.
pub fn generate_sources(module: &str, plan: &RegistrationPlan) -> Vec<GeneratedSource> {
    vec![
        registrations_source(module, plan),
        factories_source(module, &plan.factories),
        proxies_source(module, &plan.proxies),
    ]
}

fn registrations_source(module: &str, plan: &RegistrationPlan) -> GeneratedSource {
    let mut src = SourceBuilder::new(module);
    src.line("use super::container::{ContainerBuilder, Lifetime};");
    src.blank();
    src.open("pub fn register(builder: &mut ContainerBuilder) {");

    for registration in &plan.registrations {
        src.open("builder.add(");
        src.line(format!("{:?},", registration.identity));
        src.line(format!("{},", quoted_list(&registration.capabilities)));
        src.line(format!("Lifetime::{},", registration.lifetime));
        src.line(format!("{},", quoted_list(&registration.service_keys)));
        let takes_inner = registration.shape == "decorator";
        let closure = if takes_inner { "|ctx, inner|" } else { "|ctx|" };
        src.line(format!("{} {},", closure, registration.construction));
        src.close(");");
    }

    for group in &plan.decorators {
        let identities: Vec<String> = group.decorators.iter().map(|l| l.identity.clone()).collect();
        src.line(format!(
            "builder.decorate({:?}, {});",
            group.capability,
            quoted_list(&identities)
        ));
    }

    if !plan.hosted.is_empty() {
        src.line(format!("builder.hosted({});", quoted_list(&plan.hosted)));
    }
    for binding in &plan.options {
        src.line(format!(
            "builder.bind_options({:?}, {:?});",
            binding.identity, binding.section
        ));
    }

    src.close("}");
    src.finish("registrations.rs")
}

fn factories_source(module: &str, factories: &[FactoryDescriptor]) -> GeneratedSource {
    let mut src = SourceBuilder::new(module);
    if factories.is_empty() {
        src.line("// no factories");
        return src.finish("factories.rs");
    }
    src.line("use super::container::ResolutionContext;");

    for factory in factories {
        let target = TypeRef::parse(&factory.target).unwrap_or_else(|_| TypeRef::simple(&factory.target));
        src.blank();
        src.open(format!("pub struct {} {{", factory.identity));
        src.line("ctx: ResolutionContext,");
        src.close("}");
        src.blank();
        src.open(format!("impl {} {{", factory.identity));
        src.open("pub fn new(ctx: ResolutionContext) -> Self {");
        src.line("Self { ctx }");
        src.close("}");
        for method in &factory.methods {
            src.blank();
            creation_method_source(&mut src, &target, method);
        }
        src.close("}");
    }
    src.finish("factories.rs")
}

fn creation_method_source(src: &mut SourceBuilder, target: &TypeRef, method: &CreationMethod) {
    let parameters: Vec<String> = method
        .parameters
        .iter()
        .map(|p| format!("{}: {}", p.name, p.ty))
        .collect();

    let mut arguments: BTreeMap<usize, String> = method
        .parameters
        .iter()
        .map(|p| (p.position, p.name.clone()))
        .collect();
    for dependency in &method.injected {
        let call = match (&dependency.key, dependency.kind) {
            (Some(key), DependencyKind::Single) => {
                format!("self.ctx.resolve_keyed::<{}>({:?})", dependency.capability, key)
            }
            (_, DependencyKind::Collection) => {
                format!("self.ctx.resolve_all::<{}>()", dependency.capability)
            }
            (_, DependencyKind::Deferred) => {
                format!("self.ctx.deferred::<{}>()", dependency.declared)
            }
            (None, DependencyKind::Single) => {
                format!("self.ctx.resolve::<{}>()", dependency.capability)
            }
        };
        arguments.insert(dependency.position, call);
    }
    let arguments: Vec<String> = arguments.into_values().collect();

    src.open(format!(
        "pub fn {}(&self{}) -> {} {{",
        method.name,
        parameters.iter().map(|p| format!(", {}", p)).collect::<String>(),
        target
    ));
    src.line(format!("{}::new({})", type_path(target), arguments.join(", ")));
    src.close("}");
}

fn proxies_source(module: &str, proxies: &[ProxyDescriptor]) -> GeneratedSource {
    let mut src = SourceBuilder::new(module);
    if proxies.is_empty() {
        src.line("// no proxies");
        return src.finish("proxies.rs");
    }
    src.line("use super::container::ResolutionContext;");
    src.line("use futures::FutureExt;");
    src.line("use std::sync::Arc;");
    src.line("use wiremap::intercept::{invoke, invoke_blocking, Argument, Interceptor, ReturnValue};");

    for proxy in proxies {
        proxy_source(&mut src, proxy);
    }
    src.finish("proxies.rs")
}

fn chain_field(proxy: &ProxyDescriptor, method: &ProxyMethod) -> String {
    if !proxy.shares_name(method) {
        return format!("{}_chain", method.name);
    }
    let lowered: String = method
        .capability
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    let prefix: Vec<&str> = lowered.split('_').filter(|part| !part.is_empty()).collect();
    format!("{}_{}_chain", prefix.join("_"), method.name)
}

/// `inner.name`, or the capability-qualified path when the name is shared.
fn inner_call(
    proxy: &ProxyDescriptor,
    method: &ProxyMethod,
    receiver: &str,
    names: &[&str],
) -> String {
    if proxy.shares_name(method) {
        let mut arguments = vec![format!("&*{}", receiver)];
        arguments.extend(names.iter().map(|n| n.to_string()));
        format!(
            "<{} as {}>::{}({})",
            proxy.target,
            method.capability,
            method.name,
            arguments.join(", ")
        )
    } else {
        format!("{}.{}({})", receiver, method.name, names.join(", "))
    }
}

fn proxy_source(src: &mut SourceBuilder, proxy: &ProxyDescriptor) {
    let wrapped: Vec<&ProxyMethod> = proxy.wrapped_methods().collect();

    src.blank();
    src.open(format!("pub struct {} {{", proxy.identity));
    src.line(format!("inner: Arc<{}>,", proxy.target));
    for method in &wrapped {
        src.line(format!("{}: Vec<Arc<dyn Interceptor>>,", chain_field(proxy, method)));
    }
    src.close("}");
    src.blank();

    src.open(format!("impl {} {{", proxy.identity));
    src.open(format!(
        "pub fn new(inner: {}, ctx: &ResolutionContext) -> Self {{",
        proxy.target
    ));
    src.open("Self {");
    src.line("inner: Arc::new(inner),");
    for method in &wrapped {
        let chain: Vec<String> = method
            .interceptors
            .iter()
            .map(|i| format!("ctx.interceptor::<{}>()", i))
            .collect();
        src.line(format!("{}: vec![{}],", chain_field(proxy, method), chain.join(", ")));
    }
    src.close("}");
    src.close("}");
    src.close("}");

    let mut by_capability: BTreeMap<&str, Vec<&ProxyMethod>> = BTreeMap::new();
    for method in &proxy.methods {
        by_capability.entry(method.capability.as_str()).or_default().push(method);
    }
    for (capability, methods) in by_capability {
        src.blank();
        src.open(format!("impl {} for {} {{", capability, proxy.identity));
        for (index, method) in methods.iter().enumerate() {
            if index > 0 {
                src.blank();
            }
            proxy_method_source(src, proxy, capability, method);
        }
        src.close("}");
    }
}

fn proxy_method_source(
    src: &mut SourceBuilder,
    proxy: &ProxyDescriptor,
    capability: &str,
    method: &ProxyMethod,
) {
    let parameters: String = method
        .parameters
        .iter()
        .map(|p| format!(", {}: {}", p.name, p.ty))
        .collect();
    let names: Vec<&str> = method.parameters.iter().map(|p| p.name.as_str()).collect();
    let returns = method
        .returns
        .as_ref()
        .map(|r| format!(" -> {}", r))
        .unwrap_or_default();
    let asyncness = if method.call_kind == CallKind::Async { "async " } else { "" };

    src.open(format!(
        "{}fn {}(&self{}){} {{",
        asyncness, method.name, parameters, returns
    ));

    if !method.is_wrapped() {
        let await_suffix = if method.call_kind == CallKind::Async { ".await" } else { "" };
        src.line(format!("{}{}", inner_call(proxy, method, "self.inner", &names), await_suffix));
        src.close("}");
        return;
    }

    let qualified = format!("{}::{}", capability, method.name);
    let boxed: Vec<String> = names.iter().map(|n| format!("Box::new({}) as Argument", n)).collect();
    src.line("let inner = Arc::clone(&self.inner);");
    src.line(format!("let arguments: Vec<Argument> = vec![{}];", boxed.join(", ")));
    src.open("let target = Box::new(move |mut arguments: Vec<Argument>| {");
    src.open("async move {");
    for (name, parameter) in names.iter().zip(&method.parameters) {
        src.line(format!(
            "let {} = *arguments.remove(0).downcast::<{}>().expect(\"argument type\");",
            name, parameter.ty
        ));
    }
    let call = format!(
        "{}{}",
        inner_call(proxy, method, "inner", &names),
        if method.call_kind == CallKind::Async { ".await" } else { "" }
    );
    if method.returns.is_some() {
        src.line(format!("ReturnValue::value({})", call));
    } else {
        src.line(format!("{};", call));
        src.line("ReturnValue::Unit");
    }
    src.close("}");
    src.line(".boxed()");
    src.close("});");

    let invocation = match method.call_kind {
        CallKind::Async => format!(
            "invoke(&self.{}, {:?}, arguments, target).await",
            chain_field(proxy, method),
            qualified
        ),
        CallKind::Sync | CallKind::Unit => format!(
            "invoke_blocking(&self.{}, {:?}, arguments, target)",
            chain_field(proxy, method),
            qualified
        ),
    };
    match &method.returns {
        Some(ty) => {
            src.line(invocation);
            src.line(format!(
                "    .into_value::<{}>({:?})",
                ty, qualified
            ));
            src.line("    .expect(\"interceptor returned a foreign value\")");
        }
        None => src.line(format!("{};", invocation)),
    }
    src.close("}");
}
