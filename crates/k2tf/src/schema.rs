//! Target schema lookups by dotted path (`kubernetes_deployment.spec.replicas`).

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::SchemaError;

/// Container shape the target schema expects for a source mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shape {
    #[default]
    Block,
    Map,
}

/// Read-only view of the target configuration schema. All answers are pure
/// functions of the path, so one oracle can serve many translations.
pub trait SchemaOracle: Send + Sync {
    /// Whether the path names an attribute or block of the schema. Missing
    /// paths are unsupported, never an error.
    fn is_supported(&self, path: &str) -> bool;

    /// The schema's own required flag for the path.
    fn is_required(&self, path: &str) -> bool;

    fn expected_shape(&self, path: &str) -> Shape;

    fn resource_supported(&self, resource_type: &str) -> bool {
        self.is_supported(resource_type)
    }
}

/// Accepts every path as a block. Used when no schema is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct Permissive;

impl SchemaOracle for Permissive {
    fn is_supported(&self, _path: &str) -> bool {
        true
    }

    fn is_required(&self, _path: &str) -> bool {
        false
    }

    fn expected_shape(&self, _path: &str) -> Shape {
        Shape::Block
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaBlock {
    #[serde(default)]
    pub attributes: BTreeMap<String, SchemaAttribute>,
    #[serde(default)]
    pub block_types: BTreeMap<String, SchemaBlockType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaAttribute {
    /// Type constraint, e.g. `"string"` or `["map", "string"]`.
    #[serde(rename = "type", default)]
    pub ty: serde_json::Value,
    #[serde(default)]
    pub nested_type: Option<SchemaBlock>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub computed: bool,
}

impl SchemaAttribute {
    pub fn is_map(&self) -> bool {
        self.ty
            .as_array()
            .and_then(|ty| ty.first())
            .and_then(|kind| kind.as_str())
            == Some("map")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaBlockType {
    #[serde(default)]
    pub nesting_mode: Option<String>,
    #[serde(default)]
    pub block: SchemaBlock,
    #[serde(default)]
    pub min_items: Option<u64>,
    #[serde(default)]
    pub max_items: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceSchema {
    #[serde(default)]
    pub version: Option<u64>,
    #[serde(default)]
    pub block: SchemaBlock,
}

#[derive(Debug, Deserialize)]
struct ProviderEntry {
    #[serde(default)]
    resource_schemas: BTreeMap<String, ResourceSchema>,
}

/// Accepted layouts: the full `terraform providers schema -json` output, or a
/// single provider object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SchemaFile {
    Providers {
        provider_schemas: BTreeMap<String, ProviderEntry>,
    },
    Provider(ProviderEntry),
}

/// What a schema path resolved to.
#[derive(Debug, Clone, Copy)]
pub enum SchemaEntry<'a> {
    Resource(&'a ResourceSchema),
    Attribute(&'a SchemaAttribute),
    Block(&'a SchemaBlockType),
}

/// Provider schema loaded from Terraform's JSON schema output.
#[derive(Debug, Clone, Default)]
pub struct ProviderSchema {
    resources: BTreeMap<String, ResourceSchema>,
}

impl ProviderSchema {
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        Self::from_file(serde_json::from_str(json)?)
    }

    pub fn from_reader(reader: impl std::io::Read) -> Result<Self, SchemaError> {
        Self::from_file(serde_json::from_reader(reader)?)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, SchemaError> {
        Self::from_file(serde_json::from_value(value)?)
    }

    fn from_file(file: SchemaFile) -> Result<Self, SchemaError> {
        let resources: BTreeMap<_, _> = match file {
            SchemaFile::Providers { provider_schemas } => provider_schemas
                .into_values()
                .flat_map(|provider| provider.resource_schemas)
                .collect(),
            SchemaFile::Provider(provider) => provider.resource_schemas,
        };
        if resources.is_empty() {
            return Err(SchemaError::NoResources);
        }
        tracing::debug!(resources = resources.len(), "loaded provider schema");
        Ok(Self { resources })
    }

    pub fn resource(&self, name: &str) -> Option<&ResourceSchema> {
        self.resources.get(name)
    }

    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    /// Resolve a dotted path. The first segment names the resource, the rest
    /// walk nested blocks.
    pub fn lookup(&self, path: &str) -> Option<SchemaEntry<'_>> {
        let mut segments = path.split('.');
        let resource = self.resources.get(segments.next()?)?;
        let mut block = &resource.block;
        let mut entry = SchemaEntry::Resource(resource);

        for segment in segments {
            let next = match entry {
                SchemaEntry::Resource(_) => Some(block),
                SchemaEntry::Block(block_type) => Some(&block_type.block),
                SchemaEntry::Attribute(attribute) => attribute.nested_type.as_ref(),
            }?;
            block = next;
            entry = if let Some(attribute) = block.attributes.get(segment) {
                SchemaEntry::Attribute(attribute)
            } else {
                SchemaEntry::Block(block.block_types.get(segment)?)
            };
        }
        Some(entry)
    }
}

impl SchemaOracle for ProviderSchema {
    fn is_supported(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    fn is_required(&self, path: &str) -> bool {
        match self.lookup(path) {
            Some(SchemaEntry::Attribute(attribute)) => attribute.required,
            Some(SchemaEntry::Block(block_type)) => block_type.min_items.unwrap_or(0) >= 1,
            _ => false,
        }
    }

    fn expected_shape(&self, path: &str) -> Shape {
        match self.lookup(path) {
            Some(SchemaEntry::Attribute(attribute)) if attribute.is_map() => Shape::Map,
            _ => Shape::Block,
        }
    }

    fn resource_supported(&self, resource_type: &str) -> bool {
        self.resources.contains_key(resource_type)
    }
}
