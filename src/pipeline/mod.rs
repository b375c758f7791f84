//! The compilation pipeline for one module.
//!
//! Stages run in a fixed order and every stage always runs: a failure found
//! early never hides what a later stage would report. The whole pass is a
//! pure function of the type universe and the configuration.

use crate::config::WiremapConfig;
use crate::core::DescriptorSet;
use crate::decorators::{expand_open_decorators, resolve_decorators};
use crate::diagnostics::{Diagnostics, Severity};
use crate::emit::{build_plan, fingerprint, generate_sources, GeneratedSource, RegistrationPlan};
use crate::extraction::{Extraction, Extractor};
use crate::factory::partition_factories;
use crate::graph::{report_cycles, validate_lifetimes, DependencyGraph};
use crate::intercept::synthesize_proxies;
use crate::model::{ModuleModel, TypeSource, TypeUniverse};
use crate::registry::{ConflictPolicy, PlanRegistry};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug_span, info, info_span};

/// Everything one module compilation produces.
#[derive(Debug, Serialize)]
pub struct CompilationOutput {
    pub module: String,
    pub plan: RegistrationPlan,
    pub diagnostics: Diagnostics,
    pub sources: Vec<GeneratedSource>,
    /// SHA-256 of the canonical plan; empty if the plan could not be encoded.
    pub fingerprint: String,
    /// Every descriptor the module can see, including referenced modules.
    #[serde(skip)]
    pub descriptors: DescriptorSet,
    #[serde(skip)]
    pub graph: DependencyGraph,
}

impl CompilationOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

/// Run every stage over the universe visible to one module.
pub fn compile<S: TypeSource>(source: &S, config: &WiremapConfig) -> CompilationOutput {
    let module = source.current_module().to_string();
    let span = info_span!("compile", module = %module);
    let _guard = span.enter();

    let mut diagnostics = Diagnostics::new();
    let extractor = Extractor::new(source, config);

    let Extraction {
        mut descriptors,
        open_decorators,
    } = {
        let _span = debug_span!("extract").entered();
        extractor.extract(&mut diagnostics)
    };

    {
        let _span = debug_span!("expand_decorators").entered();
        let closed =
            expand_open_decorators(&extractor, &open_decorators, &descriptors, &mut diagnostics);
        descriptors.extend(closed);
    }

    let partitioned = {
        let _span = debug_span!("partition_factories").entered();
        partition_factories(&descriptors, &mut diagnostics)
    };
    descriptors.extend(partitioned.components);

    let set = DescriptorSet::new(descriptors);

    let graph = {
        let _span = debug_span!("graph").entered();
        let graph = DependencyGraph::build(&set, &mut diagnostics);
        report_cycles(&set, &graph, &mut diagnostics);
        validate_lifetimes(&set, &graph, config, &mut diagnostics);
        graph
    };

    let decorators = {
        let _span = debug_span!("decorators").entered();
        resolve_decorators(&set, &mut diagnostics)
    };

    let proxies = {
        let _span = debug_span!("interception").entered();
        synthesize_proxies(source, &set, &mut diagnostics)
    };

    let mut plan = build_plan(&set, decorators, partitioned.factories, proxies);
    plan.retain_module(&module);

    let sources = generate_sources(&module, &plan);
    let fingerprint = fingerprint(&plan).unwrap_or_else(|e| {
        tracing::warn!(module = %module, "could not fingerprint plan: {}", e);
        String::new()
    });

    info!(
        registrations = plan.registrations.len(),
        diagnostics = diagnostics.len(),
        errors = diagnostics.has_errors(),
        "module compiled"
    );

    CompilationOutput {
        module,
        plan,
        diagnostics,
        sources,
        fingerprint,
        descriptors: set,
        graph,
    }
}

/// Compile every module against the pool, in parallel.
///
/// Each module sees itself plus the modules it references. Modules without
/// a registry of their own are only analysed as references. Outputs come
/// back in the order of `modules`.
pub fn compile_modules(modules: &[ModuleModel], config: &WiremapConfig) -> Vec<CompilationOutput> {
    modules
        .par_iter()
        .filter(|module| module.has_registry)
        .map(|module| compile(&TypeUniverse::for_module(module, modules), config))
        .collect()
}

/// Referenced modules expected to ship a plan of their own.
///
/// A loaded module marked as having no registry is left out: extraction
/// already reports it.
pub fn required_registries(modules: &[ModuleModel]) -> Vec<String> {
    let without_registry: BTreeSet<&str> = modules
        .iter()
        .filter(|m| !m.has_registry)
        .map(|m| m.name.as_str())
        .collect();
    let required: BTreeSet<&str> = modules
        .iter()
        .filter(|m| m.has_registry)
        .flat_map(|m| m.references.iter().map(String::as_str))
        .filter(|name| !without_registry.contains(name))
        .collect();
    required.into_iter().map(str::to_string).collect()
}

/// Per-module outputs plus the merged runtime table.
#[derive(Debug, Serialize)]
pub struct CompilationReport {
    pub modules: Vec<CompilationOutput>,
    /// The aggregated plan; absent when merging failed.
    pub merged: Option<RegistrationPlan>,
    pub aggregation_error: Option<String>,
}

impl CompilationReport {
    /// Register every module plan and merge them under `policy`.
    pub fn assemble(
        modules: Vec<CompilationOutput>,
        required: &[String],
        policy: ConflictPolicy,
    ) -> Self {
        let _span = info_span!("aggregate", modules = modules.len(), policy = %policy).entered();
        let mut registry = PlanRegistry::new();
        for output in &modules {
            registry.register(output.module.clone(), output.plan.clone());
        }

        let merged = registry
            .require(required)
            .and_then(|()| registry.aggregate(policy));
        let (merged, aggregation_error) = match merged {
            Ok(plan) => (Some(plan), None),
            Err(e) => {
                tracing::warn!("aggregation failed: {}", e);
                (None, Some(e.to_string()))
            }
        };

        Self {
            modules,
            merged,
            aggregation_error,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.aggregation_error.is_some() || self.modules.iter().any(CompilationOutput::has_errors)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.modules
            .iter()
            .map(|m| m.diagnostics.count(severity))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticCode;
    use crate::model::{parse_module, ModelFormat};
    use indoc::indoc;

    fn module(yaml: &str) -> ModuleModel {
        parse_module(yaml, ModelFormat::Yaml).unwrap()
    }

    fn compile_one(yaml: &str) -> CompilationOutput {
        let module = module(yaml);
        compile(
            &TypeUniverse::for_module(&module, &[]),
            &WiremapConfig::default(),
        )
    }

    #[test]
    fn test_compile_registers_and_resolves() {
        let output = compile_one(indoc! {r#"
            name: app
            capabilities:
              - name: Clock
            types:
              - name: SystemClock
                implements: [Clock]
                constructors:
                  - parameters: []
              - name: Report
                attributes:
                  - kind: lifetime
                    value: scoped
                constructors:
                  - parameters:
                      - name: clock
                        ty: Clock
        "#});

        assert!(!output.has_errors(), "{:?}", output.diagnostics);
        let report = output.plan.registration("Report").unwrap();
        assert_eq!(report.construction, "Report::new(ctx.resolve::<Clock>())");
        assert_eq!(output.graph.edge_count(), 1);
        assert_eq!(output.fingerprint.len(), 64);
        assert_eq!(output.sources.len(), 3);
    }

    #[test]
    fn test_every_stage_reports_in_one_pass() {
        let output = compile_one(indoc! {r#"
            name: app
            capabilities:
              - name: Mailer
            types:
              - name: A
                constructors:
                  - parameters:
                      - name: b
                        ty: B
              - name: B
                constructors:
                  - parameters:
                      - name: a
                        ty: A
              - name: Notifier
                constructors:
                  - parameters:
                      - name: mailer
                        ty: Mailer
        "#});

        assert!(output.has_errors());
        assert_eq!(
            output
                .diagnostics
                .with_code(DiagnosticCode::DEPENDENCY_CYCLE)
                .count(),
            1
        );
        assert_eq!(
            output
                .diagnostics
                .with_code(DiagnosticCode::UNRESOLVED_DEPENDENCY)
                .count(),
            1
        );
    }

    #[test]
    fn test_compile_is_deterministic() {
        let yaml = indoc! {r#"
            name: app
            types:
              - name: Zeta
                constructors:
                  - parameters: []
              - name: Alpha
                constructors:
                  - parameters: []
        "#};
        let first = compile_one(yaml);
        let second = compile_one(yaml);
        assert_eq!(first.fingerprint, second.fingerprint);
        assert_eq!(first.sources, second.sources);
    }

    #[test]
    fn test_compile_modules_keeps_input_order() {
        let infra = module(indoc! {r#"
            name: infra
            types:
              - name: SystemClock
                constructors:
                  - parameters: []
        "#});
        let app = module(indoc! {r#"
            name: app
            references: [infra]
            types:
              - name: Report
                constructors:
                  - parameters:
                      - name: clock
                        ty: SystemClock
        "#});

        let outputs = compile_modules(&[infra, app], &WiremapConfig::default());
        let names: Vec<&str> = outputs.iter().map(|o| o.module.as_str()).collect();
        assert_eq!(names, vec!["infra", "app"]);

        let app = &outputs[1];
        assert!(!app.has_errors(), "{:?}", app.diagnostics);
        assert!(app.plan.registration("SystemClock").is_none());
        assert!(app.plan.registration("Report").is_some());

        let report = CompilationReport::assemble(outputs, &[], ConflictPolicy::Fail);
        assert!(!report.has_errors());
        let merged = report.merged.unwrap();
        assert!(merged.registration("SystemClock").is_some());
        assert!(merged.registration("Report").is_some());
    }

    #[test]
    fn test_required_registries_skip_modules_without_one() {
        let plugins = ModuleModel {
            name: "plugins".into(),
            has_registry: false,
            ..Default::default()
        };
        let app = ModuleModel {
            name: "app".into(),
            references: vec!["plugins".into(), "infra".into()],
            has_registry: true,
            ..Default::default()
        };
        assert_eq!(required_registries(&[plugins, app]), vec!["infra".to_string()]);
    }

    #[test]
    fn test_missing_registry_fails_the_report() {
        let output = compile_one(indoc! {r#"
            name: app
            references: [infra]
        "#});
        let report =
            CompilationReport::assemble(vec![output], &["infra".to_string()], ConflictPolicy::Fail);
        assert!(report.has_errors());
        assert!(report.merged.is_none());
        assert!(report
            .aggregation_error
            .unwrap()
            .contains("infra"));
    }
}
