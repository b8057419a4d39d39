use indexmap::IndexMap;
use k2tf_document::{BlockId, BlockTree, Disposition};
use tracing::debug;

use crate::config::EngineConfig;
use crate::convert::{ScalarSite, ValueConverter};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::TranslateError;
use crate::naming::{NameMapper, map_key};
use crate::schema::{SchemaOracle, Shape};
use crate::source::{Field, NodeShape, Record, Scalar, SourceNode, SourceObject};

/// Result of translating one object.
#[derive(Debug, Clone)]
pub struct Translation {
    pub tree: BlockTree,
    pub diagnostics: Diagnostics,
}

impl Translation {
    pub fn warning_count(&self) -> usize {
        self.diagnostics.warning_count()
    }
}

/// Walks source objects into block trees. Holds no per-object state, so one
/// engine can translate any number of objects.
pub struct TranslationEngine<'o> {
    config: EngineConfig,
    oracle: &'o dyn SchemaOracle,
    names: NameMapper,
    converter: ValueConverter,
}

impl<'o> TranslationEngine<'o> {
    pub fn new(config: EngineConfig, oracle: &'o dyn SchemaOracle) -> Result<Self, TranslateError> {
        let names = NameMapper::new(&config.naming)?;
        let converter = ValueConverter::new(config.conversion.clone());
        Ok(Self {
            config,
            oracle,
            names,
            converter,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn names(&self) -> &NameMapper {
        &self.names
    }

    /// Terraform resource type the object translates to.
    pub fn resource_type(&self, object: &SourceObject) -> Result<String, TranslateError> {
        let kind = object.kind().ok_or(TranslateError::MissingKind)?;
        Ok(self.names.resource_type(&self.config.resource_prefix, kind))
    }

    pub fn translate(&self, object: &SourceObject) -> Result<Translation, TranslateError> {
        let record = object
            .root
            .as_record()
            .ok_or_else(|| TranslateError::RootNotRecord(object.root.shape()))?;
        let resource_type = self.resource_type(object)?;
        if !self.config.include_unsupported && !self.oracle.resource_supported(&resource_type) {
            return Err(TranslateError::UnsupportedResource(resource_type));
        }
        let name = object.name().ok_or(TranslateError::MissingName)?;
        let resource_name = self.names.resource_name(name);

        let mut walk = Walk {
            engine: self,
            tree: BlockTree::new(),
            diagnostics: Diagnostics::default(),
        };
        let root = walk.tree.open_root(
            "resource",
            vec![resource_type.clone(), resource_name],
            resource_type.as_str(),
        );
        debug!(block = %root, path = %resource_type, "open resource");
        walk.visit_fields(
            record,
            Context {
                block: root,
                path: &resource_type,
                sequence: None,
                required: true,
            },
        )?;
        walk.tree.commit_root(root)?;
        debug!(
            blocks = walk.tree.len(),
            warnings = walk.diagnostics.warning_count(),
            "translated {resource_type}"
        );

        Ok(Translation {
            tree: walk.tree,
            diagnostics: walk.diagnostics,
        })
    }
}

/// Traversal position, passed down the descent by value.
#[derive(Debug, Clone, Copy)]
struct Context<'a> {
    /// Innermost open block.
    block: BlockId,
    /// Schema path of that block.
    path: &'a str,
    /// Wire name of the sequence whose element is being visited.
    sequence: Option<&'a str>,
    /// Whether that block is kept even without a value. Empty children are
    /// only required below a required block.
    required: bool,
}

/// A block opened for a field, still collecting entries.
struct Opened {
    id: BlockId,
    path: String,
    required: bool,
}

fn join(path: &str, name: &str) -> String {
    format!("{path}.{name}")
}

/// State of one translation.
struct Walk<'e, 'o> {
    engine: &'e TranslationEngine<'o>,
    tree: BlockTree,
    diagnostics: Diagnostics,
}

impl Walk<'_, '_> {
    fn visit_fields(&mut self, record: &Record, ctx: Context<'_>) -> Result<(), TranslateError> {
        let at_root = self.tree.node(ctx.block).parent.is_none();
        for field in &record.fields {
            let key = field.key();
            if self.engine.config.is_ignored(key, at_root) {
                debug!(field = key, "ignored");
                continue;
            }
            if field.meta.is_none() {
                self.diagnostics.record(
                    DiagnosticKind::MissingWireName,
                    ctx.path,
                    format!("field '{}' has no wire name", field.name),
                );
            }
            self.visit_field(field, ctx)?;
        }
        Ok(())
    }

    fn visit_field(&mut self, field: &Field, ctx: Context<'_>) -> Result<(), TranslateError> {
        let key = field.key();
        match &field.value {
            SourceNode::Null => Ok(()),
            SourceNode::Scalar(scalar) => {
                self.visit_scalar(key, scalar, ctx);
                Ok(())
            }
            SourceNode::Record(record) => self.visit_record(record, field, None, ctx),
            SourceNode::Mapping(entries) => self.visit_mapping(entries, field, ctx.sequence, ctx),
            SourceNode::Sequence(items) => self.visit_sequence(items, field, ctx),
        }
    }

    /// Path of a new attribute, or `None` when the schema excludes it.
    fn attribute_path(&mut self, name: &str, ctx: Context<'_>) -> Option<String> {
        let path = join(ctx.path, name);
        if self.engine.config.include_unsupported || self.engine.oracle.is_supported(&path) {
            Some(path)
        } else {
            self.diagnostics.excluded(&path);
            None
        }
    }

    fn visit_scalar(&mut self, key: &str, scalar: &Scalar, ctx: Context<'_>) {
        if scalar.is_zero() && !self.engine.config.is_included_on_zero(key) {
            return;
        }
        let name = self.engine.names.attribute_name(key, ctx.path);
        let Some(path) = self.attribute_path(&name, ctx) else {
            return;
        };
        let site = ScalarSite {
            field: key,
            sequence: ctx.sequence,
            path: &path,
        };
        let value = self
            .engine
            .converter
            .convert_scalar(scalar, &site, &mut self.diagnostics);
        self.tree.set_attribute(ctx.block, name, value);
        self.tree.node_mut(ctx.block).has_value = true;
    }

    /// Open a child block for `field`. Returns `None` when the schema rejects
    /// it, in which case the block is already closed and its subtree must be
    /// skipped.
    fn open(&mut self, field: &Field, ctx: Context<'_>) -> Result<Option<Opened>, TranslateError> {
        let key = field.key();
        let inlined = field.is_inline();
        let name = self.engine.names.block_name(key, ctx.path);
        let path = if inlined {
            ctx.path.to_string()
        } else {
            join(ctx.path, &name)
        };
        let id = self.tree.open_child(ctx.block, name, path.as_str(), inlined);
        debug!(block = %id, path = %path, inlined, "open");

        if !inlined && !self.engine.oracle.is_supported(&path) {
            self.tree.node_mut(id).unsupported = true;
            if !self.engine.config.include_unsupported {
                self.tree.close(id, Disposition::Reject)?;
                self.diagnostics.excluded(&path);
                return Ok(None);
            }
        }

        let declared = field.meta.as_ref().is_some_and(|meta| meta.required);
        let required =
            !inlined && ctx.required && (declared || self.engine.oracle.is_required(&path));
        Ok(Some(Opened { id, path, required }))
    }

    fn visit_record(
        &mut self,
        record: &Record,
        field: &Field,
        sequence: Option<&str>,
        ctx: Context<'_>,
    ) -> Result<(), TranslateError> {
        let Some(opened) = self.open(field, ctx)? else {
            return Ok(());
        };
        self.visit_fields(
            record,
            Context {
                block: opened.id,
                path: &opened.path,
                sequence,
                required: opened.required,
            },
        )?;
        self.close(&opened, field.key())
    }

    fn visit_mapping(
        &mut self,
        entries: &IndexMap<String, SourceNode>,
        field: &Field,
        sequence: Option<&str>,
        ctx: Context<'_>,
    ) -> Result<(), TranslateError> {
        let Some(opened) = self.open(field, ctx)? else {
            return Ok(());
        };
        let (id, path) = (opened.id, opened.path.as_str());
        let is_map = self.engine.oracle.expected_shape(path) == Shape::Map;
        self.tree.node_mut(id).is_map = is_map;

        for (entry_key, value) in entries {
            if value.is_zero() {
                continue;
            }
            let site = ScalarSite {
                field: entry_key,
                sequence,
                path,
            };
            let Some(value) = self
                .engine
                .converter
                .convert(value, &site, &mut self.diagnostics)
            else {
                continue;
            };
            let entry_key = map_key(entry_key);
            if is_map {
                self.tree.insert_map_entry(id, entry_key, value);
            } else {
                self.tree.set_attribute(id, entry_key, value);
            }
            self.tree.node_mut(id).has_value = true;
        }
        self.close(&opened, field.key())
    }

    fn visit_sequence(
        &mut self,
        items: &[SourceNode],
        field: &Field,
        ctx: Context<'_>,
    ) -> Result<(), TranslateError> {
        let key = field.key();
        let Some(first) = items.iter().find(|item| !matches!(item, SourceNode::Null)) else {
            return Ok(());
        };

        match first.shape() {
            NodeShape::Record | NodeShape::Mapping => {
                for item in items {
                    match item {
                        SourceNode::Record(record) => {
                            self.visit_record(record, field, Some(key), ctx)?
                        }
                        SourceNode::Mapping(entries) => {
                            self.visit_mapping(entries, field, Some(key), ctx)?
                        }
                        other => debug!(field = key, shape = ?other.shape(), "skipped element"),
                    }
                }
            }
            _ => {
                let name = self.engine.names.attribute_name(key, ctx.path);
                let Some(path) = self.attribute_path(&name, ctx) else {
                    return Ok(());
                };
                let site = ScalarSite {
                    field: key,
                    sequence: Some(key),
                    path: &path,
                };
                let list = SourceNode::Sequence(items.to_vec());
                if let Some(value) = self
                    .engine
                    .converter
                    .convert(&list, &site, &mut self.diagnostics)
                {
                    self.tree.set_attribute(ctx.block, name, value);
                    self.tree.node_mut(ctx.block).has_value = true;
                }
            }
        }
        Ok(())
    }

    /// Decide the fate of a finished block.
    fn close(&mut self, opened: &Opened, key: &str) -> Result<(), TranslateError> {
        let id = opened.id;
        let node = self.tree.node(id);
        let (parent, has_value, inlined, is_map) =
            (node.parent, node.has_value, node.inlined, node.is_map);
        let kept_on_zero = self.engine.config.is_included_on_zero(key);
        // Requiredness alone keeps a block but does not mark its parent.
        let required = opened.required;

        let disposition = if has_value || kept_on_zero || required {
            if has_value || kept_on_zero {
                if let Some(parent) = parent {
                    self.tree.node_mut(parent).has_value = true;
                }
            }
            if is_map {
                Disposition::AttachAsMap
            } else if inlined {
                Disposition::Flatten
            } else {
                Disposition::Attach
            }
        } else {
            Disposition::Drop
        };

        let state = self.tree.close(id, disposition)?;
        debug!(block = %id, ?state, "close");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use k2tf_document::{BlockState, Value};
    use serde_json::json;

    use super::*;
    use crate::schema::{Permissive, ProviderSchema};

    fn object(kind: &str, spec: Record) -> SourceObject {
        SourceObject::new(
            Record::new(kind)
                .with(Field::new("apiVersion", "v1"))
                .with(Field::new("kind", kind))
                .with(Field::new(
                    "metadata",
                    Record::new("ObjectMeta").with(Field::new("name", "test")),
                ))
                .with(Field::new("spec", spec)),
        )
    }

    fn translate(oracle: &dyn SchemaOracle, object: &SourceObject) -> Translation {
        TranslationEngine::new(EngineConfig::default(), oracle)
            .unwrap()
            .translate(object)
            .unwrap()
    }

    #[test]
    fn test_root_labels_and_ignored_fields() {
        let t = translate(&Permissive, &object("Pod", Record::new("PodSpec")));
        let root = t.tree.root().unwrap();
        assert_eq!(root.name(), "resource");
        assert_eq!(root.labels(), ["kubernetes_pod", "test"]);
        assert_eq!(root.attribute("api_version"), None);
        assert_eq!(root.attribute("kind"), None);
        // the empty spec was dropped
        assert!(root.block("spec").is_none());
        assert!(root.block("metadata").is_some());
    }

    #[test]
    fn test_type_metadata_is_only_ignored_on_the_resource() {
        let binding = SourceObject::new(
            Record::new("RoleBinding")
                .with(Field::new("apiVersion", "rbac.authorization.k8s.io/v1"))
                .with(Field::new("kind", "RoleBinding"))
                .with(Field::new(
                    "metadata",
                    Record::new("ObjectMeta").with(Field::new("name", "read-pods")),
                ))
                .with(Field::new(
                    "roleRef",
                    Record::new("RoleRef")
                        .with(Field::new("apiGroup", "rbac.authorization.k8s.io"))
                        .with(Field::new("kind", "Role"))
                        .with(Field::new("name", "pod-reader")),
                )),
        );
        let t = translate(&Permissive, &binding);
        let root = t.tree.root().unwrap();
        assert_eq!(root.attribute("kind"), None);
        let role_ref = root.block("role_ref").unwrap();
        assert_eq!(role_ref.attribute("kind"), Some(&Value::from("Role")));
        assert_eq!(
            role_ref.attribute("api_group"),
            Some(&Value::from("rbac.authorization.k8s.io"))
        );
    }

    #[test]
    fn test_zero_scalars_are_skipped() {
        let spec = Record::new("PodSpec")
            .with(Field::new("hostname", ""))
            .with(Field::new("hostNetwork", false))
            .with(Field::new("priority", 0))
            .with(Field::new("restartPolicy", "Always"));
        let t = translate(&Permissive, &object("Pod", spec));
        let spec = t.tree.root().unwrap().block("spec").unwrap();
        assert_eq!(spec.attributes().count(), 1);
        assert_eq!(spec.attribute("restart_policy"), Some(&Value::from("Always")));
    }

    #[test]
    fn test_run_as_user_zero_is_kept() {
        let spec = Record::new("PodSpec").with(Field::new(
            "securityContext",
            Record::new("PodSecurityContext").with(Field::new("runAsUser", 0)),
        ));
        let t = translate(&Permissive, &object("Pod", spec));
        let security = t
            .tree
            .root()
            .unwrap()
            .block("spec")
            .and_then(|spec| spec.block("security_context"))
            .unwrap();
        assert_eq!(security.attribute("run_as_user"), Some(&Value::Int(0)));
    }

    #[test]
    fn test_empty_dir_is_kept_when_empty() {
        let volume = Record::new("Volume")
            .with(Field::new("name", "cache"))
            .with(
                Field::untagged(
                    "VolumeSource",
                    Record::new("VolumeSource").with(Field::new(
                        "emptyDir",
                        Record::new("EmptyDirVolumeSource"),
                    )),
                )
                .inline(),
            );
        let spec =
            Record::new("PodSpec").with(Field::new("volumes", SourceNode::sequence([volume])));
        let t = translate(&Permissive, &object("Pod", spec));
        let volume = t
            .tree
            .root()
            .unwrap()
            .block("spec")
            .and_then(|spec| spec.block("volume"))
            .unwrap();
        assert_eq!(volume.attribute("name"), Some(&Value::from("cache")));
        let empty_dir = volume.block("empty_dir").unwrap();
        assert!(empty_dir.is_empty());
        assert!(volume.block("volume_source").is_none());
    }

    #[test]
    fn test_unsupported_block_is_rejected_without_visiting_children() {
        let schema = ProviderSchema::from_value(json!({
            "resource_schemas": {
                "kubernetes_pod": {
                    "block": {
                        "block_types": {
                            "metadata": {
                                "block": { "attributes": { "name": { "type": "string" } } }
                            },
                            "spec": { "block": {} }
                        }
                    }
                }
            }
        }))
        .unwrap();
        let spec = Record::new("PodSpec").with(Field::new(
            "overhead",
            Record::new("Overhead")
                .with(Field::new("a", "1"))
                .with(Field::new("b", "2")),
        ));
        let t = translate(&schema, &object("Pod", spec));
        assert_eq!(t.warning_count(), 1);
        let rejected = (0..t.tree.len())
            .map(|i| t.tree.node(BlockId(i)))
            .find(|node| node.name == "overhead")
            .unwrap();
        assert_eq!(rejected.state(), BlockState::Rejected);
        assert!(rejected.unsupported);
        // rejection does not mark the parent populated
        assert!(t.tree.root().unwrap().block("spec").is_none());
    }

    #[test]
    fn test_include_unsupported_keeps_everything() {
        let schema = ProviderSchema::from_value(json!({
            "resource_schemas": { "kubernetes_pod": { "block": {} } }
        }))
        .unwrap();
        let config = EngineConfig {
            include_unsupported: true,
            ..EngineConfig::default()
        };
        let spec = Record::new("PodSpec").with(Field::new("nodeName", "node-1"));
        let t = TranslationEngine::new(config, &schema)
            .unwrap()
            .translate(&object("Pod", spec))
            .unwrap();
        assert_eq!(t.warning_count(), 0);
        let spec = t.tree.root().unwrap().block("spec").unwrap();
        assert!(spec.node().unsupported);
        assert_eq!(spec.attribute("node_name"), Some(&Value::from("node-1")));
    }

    #[test]
    fn test_structural_errors() {
        let engine = TranslationEngine::new(EngineConfig::default(), &Permissive).unwrap();
        assert!(matches!(
            engine.translate(&SourceObject::new(SourceNode::from("scalar"))),
            Err(TranslateError::RootNotRecord(NodeShape::Scalar))
        ));
        assert!(matches!(
            engine.translate(&SourceObject::new(Record::new(""))),
            Err(TranslateError::MissingKind)
        ));
        assert!(matches!(
            engine.translate(&SourceObject::new(Record::new("Pod"))),
            Err(TranslateError::MissingName)
        ));

        let schema = ProviderSchema::from_value(json!({
            "resource_schemas": { "kubernetes_pod": { "block": {} } }
        }))
        .unwrap();
        let engine = TranslationEngine::new(EngineConfig::default(), &schema).unwrap();
        assert!(matches!(
            engine.translate(&object("Secret", Record::new("SecretSpec"))),
            Err(TranslateError::UnsupportedResource(ty)) if ty == "kubernetes_secret"
        ));
    }

    #[test]
    fn test_missing_wire_name_is_noted() {
        let spec = Record::new("PodSpec").with(Field::untagged("NodeName", "node-1"));
        let t = translate(&Permissive, &object("Pod", spec));
        assert_eq!(t.diagnostics.of_kind(DiagnosticKind::MissingWireName).count(), 1);
        assert_eq!(t.warning_count(), 0);
        let spec = t.tree.root().unwrap().block("spec").unwrap();
        assert_eq!(spec.attribute("node_name"), Some(&Value::from("node-1")));
    }

    #[test]
    fn test_scalar_sequence_becomes_list_attribute() {
        let container = Record::new("Container")
            .with(Field::new("name", "app"))
            .with(Field::new("args", SourceNode::sequence(["--port", "80"])))
            .with(Field::new("command", SourceNode::sequence(Vec::<&str>::new())));
        let spec = Record::new("PodSpec")
            .with(Field::new("containers", SourceNode::sequence([container])));
        let t = translate(&Permissive, &object("Pod", spec));
        let container = t
            .tree
            .root()
            .unwrap()
            .block("spec")
            .and_then(|spec| spec.block("container"))
            .unwrap();
        assert_eq!(container.attribute("args"), Some(&Value::from(vec!["--port", "80"])));
        assert_eq!(container.attribute("command"), None);
    }

    #[test]
    fn test_declared_requiredness_follows_required_parents() {
        let spec = Record::new("PodSpec")
            .with(Field::new("hostname", "h"))
            .with(Field::new("dnsConfig", Record::new("PodDNSConfig")).required());
        let object = SourceObject::new(
            Record::new("Pod")
                .with(Field::new("kind", "Pod"))
                .with(Field::new(
                    "metadata",
                    Record::new("ObjectMeta").with(Field::new("name", "test")),
                ))
                .with(Field::new("spec", spec))
                .with(Field::new("readinessGates", Record::new("Gates")).required()),
        );
        let t = translate(&Permissive, &object);
        let root = t.tree.root().unwrap();

        // required directly under the resource, so kept while empty
        assert!(root.block("readiness_gate").unwrap().is_empty());
        // spec is optional, so its empty required child is dropped
        let spec = root.block("spec").unwrap();
        assert_eq!(spec.attribute("hostname"), Some(&Value::from("h")));
        assert!(spec.block("dns_config").is_none());
    }

    #[test]
    fn test_mapping_elements_see_their_sequence() {
        let item = SourceNode::mapping([
            ("key", SourceNode::from("app.conf")),
            ("mode", SourceNode::from(256)),
        ]);
        let config_map = Record::new("ConfigMapVolumeSource")
            .with(Field::new("items", SourceNode::sequence([item])));
        let spec = Record::new("PodSpec").with(Field::new("configMap", config_map));
        let t = translate(&Permissive, &object("Pod", spec));
        let item = t
            .tree
            .root()
            .unwrap()
            .block("spec")
            .and_then(|spec| spec.block("config_map"))
            .and_then(|config_map| config_map.block("items"))
            .unwrap();
        assert_eq!(item.attribute("mode"), Some(&Value::from("0400")));
        assert_eq!(item.attribute("key"), Some(&Value::from("app.conf")));
    }
}
