//! The registry of registries.
//!
//! Each module emits its own [`RegistrationPlan`]. At start-up the host
//! registers every module plan here and merges them once into the table
//! the runtime container reads. Merging follows registration order and a
//! fixed [`ConflictPolicy`] for identities contributed by more than one
//! module.

use crate::decorators::DecoratorGroup;
use crate::emit::RegistrationPlan;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// What to do when two modules register the same component identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Refuse to merge.
    #[default]
    Fail,
    /// Keep the registration from the module registered first.
    FirstWins,
    /// Keep the registration from the module registered last.
    LastWins,
}

impl ConflictPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictPolicy::Fail => "fail",
            ConflictPolicy::FirstWins => "first_wins",
            ConflictPolicy::LastWins => "last_wins",
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "fail" => Ok(Self::Fail),
            "first_wins" => Ok(Self::FirstWins),
            "last_wins" => Ok(Self::LastWins),
            other => Err(format!("unknown conflict policy `{}`", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregationError {
    #[error("component `{identity}` is registered by both `{first}` and `{second}`")]
    DuplicateIdentity {
        identity: String,
        first: String,
        second: String,
    },

    #[error("no registration plan for referenced module(s): {}", modules.join(", "))]
    MissingPlans { modules: Vec<String> },
}

/// Module plans in registration order.
#[derive(Debug, Clone, Default)]
pub struct PlanRegistry {
    plans: Vec<(String, RegistrationPlan)>,
}

impl PlanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the plan for `module`.
    ///
    /// Registering an identical plan again is a no-op. A different plan for
    /// an already-registered module replaces it without changing its place
    /// in the merge order. Returns whether the registry changed.
    pub fn register(&mut self, module: impl Into<String>, plan: RegistrationPlan) -> bool {
        let module = module.into();
        match self.plans.iter_mut().find(|(name, _)| *name == module) {
            Some((_, existing)) if *existing == plan => {
                tracing::trace!(module = %module, "plan already registered");
                false
            }
            Some((_, existing)) => {
                tracing::debug!(module = %module, "replacing registered plan");
                *existing = plan;
                true
            }
            None => {
                tracing::debug!(
                    module = %module,
                    registrations = plan.registrations.len(),
                    "registered plan"
                );
                self.plans.push((module, plan));
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.plans.iter().map(|(name, _)| name.as_str())
    }

    pub fn plan(&self, module: &str) -> Option<&RegistrationPlan> {
        self.plans
            .iter()
            .find(|(name, _)| name == module)
            .map(|(_, plan)| plan)
    }

    /// Fail when any of `modules` has no registered plan.
    pub fn require<I, S>(&self, modules: I) -> Result<(), AggregationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let missing: BTreeSet<String> = modules
            .into_iter()
            .filter(|m| self.plan(m.as_ref()).is_none())
            .map(|m| m.as_ref().to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AggregationError::MissingPlans {
                modules: missing.into_iter().collect(),
            })
        }
    }

    /// Decide which module owns each registered identity.
    fn owners(&self, policy: ConflictPolicy) -> Result<BTreeMap<&str, &str>, AggregationError> {
        let mut owners: BTreeMap<&str, &str> = BTreeMap::new();
        for (module, plan) in &self.plans {
            for registration in &plan.registrations {
                let identity = registration.identity.as_str();
                let Some(owner) = owners.get(identity).copied() else {
                    owners.insert(identity, module.as_str());
                    continue;
                };
                if owner == module.as_str() {
                    continue;
                }
                match policy {
                    ConflictPolicy::Fail => {
                        return Err(AggregationError::DuplicateIdentity {
                            identity: identity.to_string(),
                            first: owner.to_string(),
                            second: module.clone(),
                        });
                    }
                    ConflictPolicy::FirstWins => {
                        tracing::debug!(identity, kept = owner, dropped = %module, "duplicate identity");
                    }
                    ConflictPolicy::LastWins => {
                        tracing::debug!(identity, kept = %module, dropped = owner, "duplicate identity");
                        owners.insert(identity, module.as_str());
                    }
                }
            }
        }
        Ok(owners)
    }

    /// Merge every registered plan into one runtime table.
    ///
    /// Rows tied to a losing registration (hosted entry, options binding,
    /// proxy, factory) are dropped with it. Decorator groups for the same
    /// capability are merged across modules. The result is sorted the same
    /// way a single module plan is, so aggregating twice yields the same
    /// table.
    pub fn aggregate(&self, policy: ConflictPolicy) -> Result<RegistrationPlan, AggregationError> {
        let owners = self.owners(policy)?;
        let owned_by = |identity: &str, module: &str| {
            owners.get(identity).map_or(true, |owner| *owner == module)
        };

        let mut merged = RegistrationPlan::default();
        let mut decorators: BTreeMap<String, DecoratorGroup> = BTreeMap::new();

        for (module, plan) in &self.plans {
            let module = module.as_str();
            merged.registrations.extend(
                plan.registrations
                    .iter()
                    .filter(|r| owned_by(r.identity.as_str(), module))
                    .cloned(),
            );
            merged.hosted.extend(
                plan.hosted
                    .iter()
                    .filter(|h| owned_by(h.as_str(), module))
                    .cloned(),
            );
            merged.options.extend(
                plan.options
                    .iter()
                    .filter(|o| owned_by(o.identity.as_str(), module))
                    .cloned(),
            );
            merged.factories.extend(
                plan.factories
                    .iter()
                    .filter(|f| owned_by(f.identity.as_str(), module))
                    .cloned(),
            );
            merged.proxies.extend(
                plan.proxies
                    .iter()
                    .filter(|p| owned_by(p.target.as_str(), module))
                    .cloned(),
            );

            for group in &plan.decorators {
                match decorators.get_mut(&group.capability) {
                    Some(existing) => existing.merge(group),
                    None => {
                        decorators.insert(group.capability.clone(), group.clone());
                    }
                }
            }
        }

        merged.decorators = decorators.into_values().collect();
        merged.sort();

        tracing::info!(
            modules = self.plans.len(),
            registrations = merged.registrations.len(),
            policy = %policy,
            "aggregated registration plans"
        );
        Ok(merged)
    }
}
