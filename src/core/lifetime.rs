use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reuse scope governing a component instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifetime {
    /// One instance for the whole container.
    Singleton,
    /// One instance per resolution scope.
    Scoped,
    /// A new instance per resolution.
    Transient,
}

impl Lifetime {
    fn rank(self) -> u8 {
        match self {
            Lifetime::Singleton => 3,
            Lifetime::Scoped => 2,
            Lifetime::Transient => 1,
        }
    }

    /// Whether `self` lives strictly longer than `other`.
    pub fn outlives(self, other: Lifetime) -> bool {
        self.rank() > other.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Scoped => "scoped",
            Lifetime::Transient => "transient",
        }
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Lifetime::Singleton => "Singleton",
            Lifetime::Scoped => "Scoped",
            Lifetime::Transient => "Transient",
        };
        f.write_str(name)
    }
}

impl FromStr for Lifetime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "singleton" => Ok(Lifetime::Singleton),
            "scoped" => Ok(Lifetime::Scoped),
            "transient" => Ok(Lifetime::Transient),
            other => Err(format!("unknown lifetime `{}`", other)),
        }
    }
}

/// Where a descriptor's lifetime came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifetimeSource {
    Declared,
    /// Filled in from the configured default policy.
    Defaulted,
}
