//! Type descriptors for the resources the decoder understands.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::Deserialize;

use crate::error::CatalogError;

static BUILTIN: LazyLock<Catalog> = LazyLock::new(|| {
    Catalog::from_yaml(include_str!("catalog.yaml")).expect("invalid builtin catalog")
});

/// Declared type of a catalog field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum FieldType {
    String,
    Bool,
    Int,
    Float,
    Quantity,
    IntOrString,
    /// Decoded from the YAML structure alone.
    Any,
    /// A wrapper type carried as text, e.g. `opaque<Time>`.
    Opaque(String),
    List(Box<FieldType>),
    Map(Box<FieldType>),
    /// Another type of the catalog.
    Record(String),
}

impl FieldType {
    /// Catalog type names this type refers to.
    fn record_name(&self) -> Option<&str> {
        match self {
            Self::Record(name) => Some(name),
            Self::List(inner) | Self::Map(inner) => inner.record_name(),
            _ => None,
        }
    }
}

impl FromStr for FieldType {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((head, rest)) = s.split_once('<') {
            let inner = rest
                .strip_suffix('>')
                .ok_or_else(|| CatalogError::InvalidType(s.to_string()))?;
            return match head.trim() {
                "list" => Ok(Self::List(Box::new(inner.parse()?))),
                "map" => Ok(Self::Map(Box::new(inner.parse()?))),
                "opaque" if !inner.trim().is_empty() => Ok(Self::Opaque(inner.trim().to_string())),
                _ => Err(CatalogError::InvalidType(s.to_string())),
            };
        }
        Ok(match s {
            "string" => Self::String,
            "bool" => Self::Bool,
            "int" => Self::Int,
            "float" => Self::Float,
            "quantity" => Self::Quantity,
            "int-or-string" => Self::IntOrString,
            "any" => Self::Any,
            "list" => Self::List(Box::new(Self::Any)),
            "map" => Self::Map(Box::new(Self::Any)),
            name if is_type_name(name) => Self::Record(name.to_string()),
            _ => return Err(CatalogError::InvalidType(s.to_string())),
        })
    }
}

impl TryFrom<String> for FieldType {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Bool => f.write_str("bool"),
            Self::Int => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::Quantity => f.write_str("quantity"),
            Self::IntOrString => f.write_str("int-or-string"),
            Self::Any => f.write_str("any"),
            Self::Opaque(name) => write!(f, "opaque<{name}>"),
            Self::List(inner) => write!(f, "list<{inner}>"),
            Self::Map(inner) => write!(f, "map<{inner}>"),
            Self::Record(name) => f.write_str(name),
        }
    }
}

fn is_type_name(s: &str) -> bool {
    s.starts_with(|c: char| c.is_ascii_uppercase())
        && s.chars().all(|c| c.is_ascii_alphanumeric())
}

/// One field of a catalog type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "FieldEntry")]
pub struct CatalogField {
    pub name: String,
    pub ty: FieldType,
    /// Built from the enclosing mapping rather than from a key of its own.
    pub inline: bool,
    pub required: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldEntry {
    Name(String),
    Spec {
        name: String,
        #[serde(rename = "type", default = "string_type")]
        ty: FieldType,
        #[serde(default)]
        inline: bool,
        #[serde(default)]
        required: bool,
    },
}

fn string_type() -> FieldType {
    FieldType::String
}

impl From<FieldEntry> for CatalogField {
    fn from(entry: FieldEntry) -> Self {
        match entry {
            FieldEntry::Name(name) => Self {
                name,
                ty: FieldType::String,
                inline: false,
                required: false,
            },
            FieldEntry::Spec {
                name,
                ty,
                inline,
                required,
            } => Self {
                name,
                ty,
                inline,
                required,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Catalog {
    types: BTreeMap<String, Vec<CatalogField>>,
}

impl Catalog {
    /// The catalog shipped with the crate, covering the common core and apps
    /// resources.
    pub fn builtin() -> &'static Catalog {
        &BUILTIN
    }

    pub fn from_yaml(input: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_yaml::from_str(input)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Fields of a type in declaration order. The root type of a resource is
    /// named after its kind.
    pub fn get(&self, type_name: &str) -> Option<&[CatalogField]> {
        self.types.get(type_name).map(Vec::as_slice)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        for (owner, fields) in &self.types {
            for field in fields {
                if let Some(name) = field.ty.record_name()
                    && !self.types.contains_key(name)
                {
                    return Err(CatalogError::UnknownType {
                        owner: owner.clone(),
                        field: field.name.clone(),
                        name: name.to_string(),
                    });
                }
                if field.inline && !matches!(field.ty, FieldType::Record(_)) {
                    return Err(CatalogError::InlineNotRecord {
                        owner: owner.clone(),
                        field: field.name.clone(),
                    });
                }
            }
        }
        for owner in self.types.keys() {
            self.check_inline_chain(&mut vec![owner.as_str()], owner)?;
        }
        Ok(())
    }

    /// Inline fields are expanded into their owner while decoding, so no type
    /// may reach itself through them.
    fn check_inline_chain<'a>(
        &'a self,
        chain: &mut Vec<&'a str>,
        owner: &str,
    ) -> Result<(), CatalogError> {
        let inlined = self
            .get(owner)
            .unwrap_or_default()
            .iter()
            .filter(|field| field.inline)
            .filter_map(|field| field.ty.record_name());
        for name in inlined {
            if chain.contains(&name) {
                chain.push(name);
                return Err(CatalogError::InlineCycle(chain.join(" -> ")));
            }
            chain.push(name);
            self.check_inline_chain(chain, name)?;
            chain.pop();
        }
        Ok(())
    }
}
