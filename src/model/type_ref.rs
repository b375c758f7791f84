//! Textual type references.
//!
//! Module files spell types the way a reader would (`Repository<User>`,
//! `Vec<Handler>`, `[u8]`). They are parsed once into a [`TypeRef`] tree and
//! printed back in a canonical form that every later stage uses as identity.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Name used for slice/array types written as `[T]`.
pub const ARRAY_TYPE_NAME: &str = "[]";

/// A possibly-parameterized type reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeRef {
    pub name: String,
    pub args: Vec<TypeRef>,
}

/// Failure to parse a textual type reference.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid type reference `{input}`: {reason}")]
pub struct TypeRefParseError {
    pub input: String,
    pub reason: String,
}

impl TypeRef {
    /// Create a non-generic type reference.
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Create a generic type reference.
    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    pub fn parse(input: &str) -> Result<Self, TypeRefParseError> {
        let mut parser = Parser {
            input,
            chars: input.char_indices().peekable(),
        };
        let parsed = parser.parse_type()?;
        parser.skip_ws();
        match parser.chars.peek() {
            None => Ok(parsed),
            Some(&(pos, c)) => Err(parser.error(format!("unexpected `{}` at offset {}", c, pos))),
        }
    }

    pub fn is_generic(&self) -> bool {
        !self.args.is_empty()
    }

    pub fn is_array(&self) -> bool {
        self.name == ARRAY_TYPE_NAME
    }

    /// The single type argument of a one-argument wrapper such as `Vec<T>`.
    pub fn single_arg(&self) -> Option<&TypeRef> {
        match self.args.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// Replace type parameter names by their bound arguments.
    pub fn substitute(&self, bindings: &BTreeMap<String, TypeRef>) -> TypeRef {
        if self.args.is_empty() {
            if let Some(bound) = bindings.get(&self.name) {
                return bound.clone();
            }
        }
        TypeRef {
            name: self.name.clone(),
            args: self.args.iter().map(|a| a.substitute(bindings)).collect(),
        }
    }

    /// Whether any of the given parameter names occurs in this reference.
    pub fn mentions_any(&self, params: &[String]) -> bool {
        (self.args.is_empty() && params.iter().any(|p| *p == self.name))
            || self.args.iter().any(|a| a.mentions_any(params))
    }

    /// Match `self` (a pattern over `params`) against a concrete reference,
    /// extending `bindings`. Returns false on a structural mismatch or a
    /// conflicting binding.
    pub fn unify(
        &self,
        concrete: &TypeRef,
        params: &[String],
        bindings: &mut BTreeMap<String, TypeRef>,
    ) -> bool {
        if self.args.is_empty() && params.iter().any(|p| *p == self.name) {
            return match bindings.get(&self.name) {
                Some(existing) => existing == concrete,
                None => {
                    bindings.insert(self.name.clone(), concrete.clone());
                    true
                }
            };
        }
        self.name == concrete.name
            && self.args.len() == concrete.args.len()
            && self
                .args
                .iter()
                .zip(&concrete.args)
                .all(|(p, c)| p.unify(c, params, bindings))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_array() {
            if let Some(inner) = self.single_arg() {
                return write!(f, "[{}]", inner);
            }
        }
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

impl FromStr for TypeRef {
    type Err = TypeRefParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeRef::parse(s)
    }
}

impl TryFrom<String> for TypeRef {
    type Error = TypeRefParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TypeRef::parse(&value)
    }
}

impl From<TypeRef> for String {
    fn from(value: TypeRef) -> Self {
        value.to_string()
    }
}

struct Parser<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl Parser<'_> {
    fn error(&self, reason: impl Into<String>) -> TypeRefParseError {
        TypeRefParseError {
            input: self.input.to_string(),
            reason: reason.into(),
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.chars.peek(), Some((_, c)) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if matches!(self.chars.peek(), Some(&(_, c)) if c == expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn parse_type(&mut self) -> Result<TypeRef, TypeRefParseError> {
        if self.eat('[') {
            let inner = self.parse_type()?;
            if !self.eat(']') {
                return Err(self.error("unterminated array type"));
            }
            return Ok(TypeRef::generic(ARRAY_TYPE_NAME, vec![inner]));
        }

        let name = self.parse_name()?;
        let mut args = Vec::new();
        if self.eat('<') {
            loop {
                args.push(self.parse_type()?);
                if self.eat(',') {
                    continue;
                }
                if self.eat('>') {
                    break;
                }
                return Err(self.error("expected `,` or `>` in type arguments"));
            }
        }
        Ok(TypeRef { name, args })
    }

    fn parse_name(&mut self) -> Result<String, TypeRefParseError> {
        self.skip_ws();
        let mut name = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' || c == ':' || c == '.' {
                name.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        if name.is_empty() {
            Err(self.error("expected a type name"))
        } else {
            Ok(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_generics() {
        let parsed = TypeRef::parse("Map<String, Vec<Handler>>").unwrap();
        assert_eq!(parsed.name, "Map");
        assert_eq!(parsed.args.len(), 2);
        assert_eq!(parsed.args[1].to_string(), "Vec<Handler>");
        assert_eq!(parsed.to_string(), "Map<String, Vec<Handler>>");
    }

    #[test]
    fn test_parse_normalizes_whitespace() {
        let parsed = TypeRef::parse("  Repository< User ,Order>").unwrap();
        assert_eq!(parsed.to_string(), "Repository<User, Order>");
    }

    #[test]
    fn test_parse_array() {
        let parsed = TypeRef::parse("[u8]").unwrap();
        assert!(parsed.is_array());
        assert_eq!(parsed.to_string(), "[u8]");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(TypeRef::parse("Vec<").is_err());
        assert!(TypeRef::parse("").is_err());
        assert!(TypeRef::parse("A B").is_err());
    }

    #[test]
    fn test_unify_binds_parameters() {
        let pattern = TypeRef::parse("Repository<T>").unwrap();
        let concrete = TypeRef::parse("Repository<User>").unwrap();
        let mut bindings = BTreeMap::new();
        assert!(pattern.unify(&concrete, &["T".to_string()], &mut bindings));
        assert_eq!(bindings["T"].to_string(), "User");

        let decorated = TypeRef::parse("Caching<T>").unwrap();
        assert_eq!(decorated.substitute(&bindings).to_string(), "Caching<User>");
    }

    #[test]
    fn test_unify_rejects_conflicting_bindings() {
        let pattern = TypeRef::parse("Pair<T, T>").unwrap();
        let concrete = TypeRef::parse("Pair<A, B>").unwrap();
        let mut bindings = BTreeMap::new();
        assert!(!pattern.unify(&concrete, &["T".to_string()], &mut bindings));
    }

    #[test]
    fn test_serde_uses_canonical_text() {
        let parsed: TypeRef = serde_json::from_str("\"Lazy<Clock>\"").unwrap();
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"Lazy<Clock>\"");
    }
}
