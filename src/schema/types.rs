//! Field type expressions
//!
//! Definitions spell field types as short strings (`"list<ApplicantSocial>"`,
//! `"datetime?"`, `"union<str,int>?"`). They are parsed into an unresolved
//! [`TypeExpr`] here; names are bound to entities and enums by the builder.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SchemaError;

/// Leaf value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Int,
    Float,
    Str,
    Bool,
    Date,
    DateTime,
    /// Arbitrary JSON, kept verbatim
    Any,
}

impl PrimitiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::Int => "int",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Str => "str",
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Date => "date",
            PrimitiveKind::DateTime => "datetime",
            PrimitiveKind::Any => "any",
        }
    }

    fn from_keyword(s: &str) -> Option<Self> {
        Some(match s {
            "int" => PrimitiveKind::Int,
            "float" => PrimitiveKind::Float,
            "str" => PrimitiveKind::Str,
            "bool" => PrimitiveKind::Bool,
            "date" => PrimitiveKind::Date,
            "datetime" => PrimitiveKind::DateTime,
            "any" => PrimitiveKind::Any,
            _ => return None,
        })
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A type expression whose names are not yet bound
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Primitive(PrimitiveKind),
    /// Entity or enum, by name
    Named(String),
    List(Box<TypeExpr>),
    /// String-keyed mapping with values of the inner type
    Map(Box<TypeExpr>),
    Union(Vec<TypeExpr>),
}

impl TypeExpr {
    /// Every entity/enum name this expression mentions
    pub fn names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TypeExpr::Primitive(_) => {}
            TypeExpr::Named(name) => out.push(name),
            TypeExpr::List(inner) | TypeExpr::Map(inner) => inner.collect_names(out),
            TypeExpr::Union(alternatives) => {
                for alt in alternatives {
                    alt.collect_names(out);
                }
            }
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Primitive(kind) => write!(f, "{}", kind),
            TypeExpr::Named(name) => f.write_str(name),
            TypeExpr::List(inner) => write!(f, "list<{}>", inner),
            TypeExpr::Map(inner) => write!(f, "map<{}>", inner),
            TypeExpr::Union(alternatives) => {
                f.write_str("union<")?;
                for (i, alt) in alternatives.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", alt)?;
                }
                f.write_str(">")
            }
        }
    }
}

/// A parsed field type: expression plus nullability
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldType {
    pub expr: TypeExpr,
    /// Explicit JSON `null` is accepted (trailing `?`)
    pub nullable: bool,
}

impl FromStr for FieldType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (body, nullable) = match trimmed.strip_suffix('?') {
            Some(body) => (body, true),
            None => (trimmed, false),
        };
        let expr = parse_expr(body).map_err(|reason| SchemaError::InvalidTypeExpr {
            expr: s.to_string(),
            reason,
        })?;
        Ok(Self { expr, nullable })
    }
}

fn parse_expr(s: &str) -> Result<TypeExpr, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty type".to_string());
    }

    let Some(open) = s.find('<') else {
        if s == "map" {
            return Ok(TypeExpr::Map(Box::new(TypeExpr::Primitive(PrimitiveKind::Any))));
        }
        if let Some(kind) = PrimitiveKind::from_keyword(s) {
            return Ok(TypeExpr::Primitive(kind));
        }
        if is_identifier(s) {
            return Ok(TypeExpr::Named(s.to_string()));
        }
        return Err(format!("'{}' is not a type name", s));
    };

    if !s.ends_with('>') {
        return Err("unterminated '<'".to_string());
    }
    let head = s[..open].trim();
    let mut args = split_top_level(&s[open + 1..s.len() - 1])?
        .into_iter()
        .map(parse_expr)
        .collect::<Result<Vec<_>, _>>()?;

    match (head, args.len()) {
        ("list", 1) => Ok(TypeExpr::List(Box::new(args.remove(0)))),
        ("map", 1) => Ok(TypeExpr::Map(Box::new(args.remove(0)))),
        ("union", n) if n >= 2 => Ok(TypeExpr::Union(args)),
        ("list" | "map", n) => Err(format!("{} takes exactly one type argument, got {}", head, n)),
        ("union", _) => Err("union needs at least two alternatives".to_string()),
        (other, _) => Err(format!("'{}' takes no type arguments", other)),
    }
}

/// Split on commas that are not nested inside `<...>`
fn split_top_level(s: &str) -> Result<Vec<&str>, String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth = depth.checked_sub(1).ok_or_else(|| "unbalanced '>'".to_string())?;
            }
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err("unbalanced '<'".to_string());
    }
    parts.push(&s[start..]);
    Ok(parts)
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
