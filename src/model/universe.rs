use super::type_ref::TypeRef;
use crate::core::Lifetime;
use serde::{Deserialize, Serialize};

/// Visibility of a type or constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accessibility {
    #[default]
    Public,
    /// Visible inside its own module only.
    Internal,
    Private,
}

/// One independently-compiled module and everything it declares.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleModel {
    pub name: String,

    /// Modules this one references by name.
    #[serde(default)]
    pub references: Vec<String>,

    /// Whether the module ships its own generated registration table.
    #[serde(default = "default_true")]
    pub has_registry: bool,

    #[serde(default)]
    pub capabilities: Vec<CapabilityModel>,

    #[serde(default)]
    pub types: Vec<TypeModel>,
}

fn default_true() -> bool {
    true
}

/// A named contract with the methods a proxy would have to forward.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CapabilityModel {
    pub name: String,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    #[serde(default)]
    pub extends: Vec<TypeRef>,
    #[serde(default)]
    pub methods: Vec<MethodModel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodModel {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ParameterModel>,
    /// Result type; absent for methods with no result.
    #[serde(default)]
    pub returns: Option<TypeRef>,
    #[serde(default)]
    pub is_async: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeModel {
    pub name: String,
    #[serde(default)]
    pub accessibility: Accessibility,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    #[serde(default)]
    pub implements: Vec<TypeRef>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    /// Constructors in source declaration order.
    #[serde(default)]
    pub constructors: Vec<ConstructorModel>,
}

impl TypeModel {
    /// The type as a reference over its own type parameters, e.g. `Cache<T>`.
    pub fn self_ref(&self) -> TypeRef {
        TypeRef::generic(
            self.name.clone(),
            self.type_parameters
                .iter()
                .map(|p| TypeRef::simple(p.clone()))
                .collect(),
        )
    }

    pub fn is_open_generic(&self) -> bool {
        !self.type_parameters.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstructorModel {
    #[serde(default)]
    pub accessibility: Accessibility,
    #[serde(default)]
    pub parameters: Vec<ParameterModel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterModel {
    pub name: String,
    pub ty: TypeRef,
    /// Service key for keyed resolution.
    #[serde(default)]
    pub key: Option<String>,
}

/// A declared marker on a type, as written in the module file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Attribute {
    Lifetime {
        value: Lifetime,
    },
    /// Never register this type automatically.
    Exclude,
    /// Register only as the listed capabilities.
    RegisterAs {
        capabilities: Vec<TypeRef>,
    },
    DecoratorFor {
        capability: TypeRef,
        #[serde(default)]
        order: i32,
    },
    Intercept {
        interceptors: Vec<TypeRef>,
    },
    InterceptMethod {
        method: String,
        interceptors: Vec<TypeRef>,
    },
    GenerateFactory,
    Keyed {
        key: String,
    },
    /// Managed background component started by the host.
    Hosted,
    Options {
        section: String,
    },
}

impl Attribute {
    /// Short name used in diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            Attribute::Lifetime { .. } => "lifetime",
            Attribute::Exclude => "exclude",
            Attribute::RegisterAs { .. } => "register_as",
            Attribute::DecoratorFor { .. } => "decorator_for",
            Attribute::Intercept { .. } => "intercept",
            Attribute::InterceptMethod { .. } => "intercept_method",
            Attribute::GenerateFactory => "generate_factory",
            Attribute::Keyed { .. } => "keyed",
            Attribute::Hosted => "hosted",
            Attribute::Options { .. } => "options",
        }
    }
}

/// Queryable view over the modules visible to one compilation.
pub trait TypeSource {
    /// Name of the module being compiled.
    fn current_module(&self) -> &str;

    /// The current module followed by its references, in a stable order.
    fn modules(&self) -> Vec<&ModuleModel>;

    fn find_capability(&self, name: &str) -> Option<&CapabilityModel> {
        self.modules()
            .into_iter()
            .flat_map(|m| m.capabilities.iter())
            .find(|c| c.name == name)
    }
}

/// The current module plus every module it references.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TypeUniverse {
    pub current: String,
    pub modules: Vec<ModuleModel>,
}

impl TypeUniverse {
    pub fn new(current: impl Into<String>, modules: Vec<ModuleModel>) -> Self {
        Self {
            current: current.into(),
            modules,
        }
    }

    /// Build the universe seen by `current` out of a pool of loaded modules.
    ///
    /// Only modules named by `references` (directly) are included; modules are
    /// ordered current-first, then by name.
    pub fn for_module(current: &ModuleModel, pool: &[ModuleModel]) -> Self {
        let mut referenced: Vec<ModuleModel> = pool
            .iter()
            .filter(|m| m.name != current.name && current.references.contains(&m.name))
            .cloned()
            .collect();
        referenced.sort_by(|a, b| a.name.cmp(&b.name));

        let mut modules = vec![current.clone()];
        modules.extend(referenced);
        Self::new(current.name.clone(), modules)
    }
}

impl TypeSource for TypeUniverse {
    fn current_module(&self) -> &str {
        &self.current
    }

    fn modules(&self) -> Vec<&ModuleModel> {
        let (current, others): (Vec<&ModuleModel>, Vec<&ModuleModel>) =
            self.modules.iter().partition(|m| m.name == self.current);
        current.into_iter().chain(others).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_deserializes_tagged() {
        let attr: Attribute =
            serde_json::from_str(r#"{"kind":"decorator_for","capability":"Repo<T>","order":2}"#)
                .unwrap();
        assert_eq!(
            attr,
            Attribute::DecoratorFor {
                capability: TypeRef::parse("Repo<T>").unwrap(),
                order: 2
            }
        );
    }

    #[test]
    fn test_for_module_orders_current_first() {
        let app = ModuleModel {
            name: "app".into(),
            references: vec!["zeta".into(), "core".into()],
            ..Default::default()
        };
        let pool = vec![
            ModuleModel {
                name: "zeta".into(),
                ..Default::default()
            },
            ModuleModel {
                name: "core".into(),
                ..Default::default()
            },
            ModuleModel {
                name: "unrelated".into(),
                ..Default::default()
            },
            app.clone(),
        ];

        let universe = TypeUniverse::for_module(&app, &pool);
        let names: Vec<&str> = universe.modules().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["app", "core", "zeta"]);
    }

    #[test]
    fn test_has_registry_defaults_to_true() {
        let module: ModuleModel = serde_json::from_str(r#"{"name":"core"}"#).unwrap();
        assert!(module.has_registry);
    }
}
