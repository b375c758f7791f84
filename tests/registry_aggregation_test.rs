mod common;

use common::module;
use indoc::indoc;
use pretty_assertions::assert_eq;
use wiremap::config::WiremapConfig;
use wiremap::diagnostics::DiagnosticCode;
use wiremap::pipeline::{compile_modules, required_registries, CompilationReport};
use wiremap::registry::{AggregationError, ConflictPolicy, PlanRegistry};

const INFRA: &str = indoc! {r#"
    name: infra
    capabilities:
      - name: Repo
    types:
      - name: SqlRepo
        implements: [Repo]
        constructors:
          - parameters: []
      - name: Logging
        implements: [Repo]
        attributes:
          - kind: decorator_for
            capability: Repo
        constructors:
          - parameters:
              - name: inner
                ty: Repo
"#};

const APP: &str = indoc! {r#"
    name: app
    references: [infra]
    types:
      - name: Caching
        implements: [Repo]
        attributes:
          - kind: decorator_for
            capability: Repo
            order: 1
        constructors:
          - parameters:
              - name: inner
                ty: Repo
      - name: Checkout
        constructors:
          - parameters:
              - name: repo
                ty: Repo
"#};

#[test]
fn test_referenced_modules_merge_into_one_plan() {
    let modules = vec![module(INFRA), module(APP)];
    let outputs = compile_modules(&modules, &WiremapConfig::default());
    assert!(outputs.iter().all(|o| !o.has_errors()), "{:?}", outputs);

    let app = &outputs[1];
    assert!(app.plan.registration("SqlRepo").is_none());
    assert_eq!(app.plan.decorators[0].identities(), vec!["Caching"]);

    let report = CompilationReport::assemble(
        outputs,
        &required_registries(&modules),
        ConflictPolicy::Fail,
    );
    let merged = report.merged.expect("plans merge");
    let identities: Vec<(&str, &str)> = merged
        .registrations
        .iter()
        .map(|r| (r.module.as_str(), r.identity.as_str()))
        .collect();
    assert_eq!(
        identities,
        vec![
            ("app", "Caching"),
            ("app", "Checkout"),
            ("infra", "Logging"),
            ("infra", "SqlRepo"),
        ]
    );

    let group = &merged.decorators[0];
    assert_eq!(group.identities(), vec!["Logging", "Caching"]);
    assert_eq!(group.chains[0].expression, "Caching(Logging(SqlRepo))");
}

#[test]
fn test_missing_companion_registry_is_reported() {
    let mut infra = module(INFRA);
    infra.has_registry = false;
    let modules = vec![infra, module(APP)];
    let outputs = compile_modules(&modules, &WiremapConfig::default());

    assert_eq!(outputs.len(), 1);
    assert_eq!(
        outputs[0]
            .diagnostics
            .with_code(DiagnosticCode::MISSING_COMPANION_REGISTRY)
            .count(),
        1
    );
    assert!(outputs[0].has_errors());
}

#[test]
fn test_duplicate_identity_follows_policy() {
    let left = module(indoc! {r#"
        name: left
        types:
          - name: Clock
            constructors:
              - parameters: []
    "#});
    let right = module(indoc! {r#"
        name: right
        types:
          - name: Clock
            constructors:
              - parameters: []
    "#});
    let outputs = compile_modules(&[left, right], &WiremapConfig::default());

    let mut registry = PlanRegistry::new();
    for output in &outputs {
        registry.register(output.module.clone(), output.plan.clone());
    }

    assert_eq!(
        registry.aggregate(ConflictPolicy::Fail),
        Err(AggregationError::DuplicateIdentity {
            identity: "Clock".into(),
            first: "left".into(),
            second: "right".into(),
        })
    );

    let first = registry.aggregate(ConflictPolicy::FirstWins).unwrap();
    assert_eq!(first.registrations.len(), 1);
    assert_eq!(first.registrations[0].module, "left");

    let last = registry.aggregate(ConflictPolicy::LastWins).unwrap();
    assert_eq!(last.registrations[0].module, "right");
}
