use std::collections::HashSet;

use indexmap::IndexMap;
use k2tf::{Field, IntOrString, Quantity, Record, Scalar, SourceNode, SourceObject, Wrapper};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::catalog::{Catalog, CatalogField, FieldType};
use crate::config::Config;
use crate::error::DecodeError;

/// Objects of a YAML stream and the documents that failed to decode.
#[derive(Debug, Default)]
pub struct Decoded {
    pub objects: Vec<SourceObject>,
    pub errors: Vec<DecodeError>,
}

pub fn decode_str(input: &str, catalog: &Catalog) -> Decoded {
    decode_str_with_config(input, catalog, &Config::default())
}

/// Decode every document of a multi-document stream. A failing document is
/// reported in [`Decoded::errors`] and the stream continues, except after
/// invalid YAML, which ends it.
pub fn decode_str_with_config(input: &str, catalog: &Catalog, config: &Config) -> Decoded {
    let mut decoded = Decoded::default();
    for (index, document) in serde_yaml::Deserializer::from_str(input).enumerate() {
        let decoder = DocumentDecoder {
            catalog,
            config,
            document: index + 1,
        };
        match Value::deserialize(document) {
            Ok(value) => decoder.decode(&value, &mut decoded),
            Err(source) => {
                decoded.errors.push(DecodeError::Yaml {
                    document: decoder.document,
                    source,
                });
                break;
            }
        }
    }
    decoded
}

struct DocumentDecoder<'a> {
    catalog: &'a Catalog,
    config: &'a Config,
    document: usize,
}

impl DocumentDecoder<'_> {
    fn decode(&self, value: &Value, out: &mut Decoded) {
        let value = untag(value);
        if value.is_null() {
            debug!(document = self.document, "skipping empty document");
            return;
        }
        if self.config.expand_lists
            && let Value::Mapping(mapping) = value
            && mapping.get("kind").and_then(Value::as_str) == Some("List")
        {
            match mapping.get("items").map(untag) {
                None | Some(Value::Null) => {}
                Some(Value::Sequence(items)) => {
                    debug!(document = self.document, items = items.len(), "expanding List");
                    for item in items {
                        self.push(self.object(item), out);
                    }
                }
                Some(_) => out.errors.push(DecodeError::ListItems {
                    document: self.document,
                }),
            }
            return;
        }
        self.push(self.object(value), out);
    }

    fn push(&self, result: Result<SourceObject, DecodeError>, out: &mut Decoded) {
        match result {
            Ok(object) => out.objects.push(object),
            Err(err) => out.errors.push(err),
        }
    }

    fn object(&self, value: &Value) -> Result<SourceObject, DecodeError> {
        let Value::Mapping(mapping) = untag(value) else {
            return Err(DecodeError::NotAMapping {
                document: self.document,
            });
        };
        let kind = mapping
            .get("kind")
            .map(untag)
            .and_then(Value::as_str)
            .filter(|kind| !kind.is_empty())
            .ok_or(DecodeError::MissingKind {
                document: self.document,
            })?;

        let mut consumed = HashSet::from(["apiVersion".to_string(), "kind".to_string()]);
        let mut fields = Vec::new();
        if let Some(api_version) = mapping.get("apiVersion").map(untag).and_then(Value::as_str) {
            fields.push(Field::new("apiVersion", api_version));
        }
        fields.push(Field::new("kind", kind));

        match self.catalog.get(kind) {
            Some(declared) => {
                self.declared_fields(declared, mapping, "", &mut consumed, &mut fields)?;
                self.undeclared_fields(mapping, "", &consumed, false, &mut fields)?;
            }
            None if self.config.allow_unknown_kinds => {
                debug!(document = self.document, kind, "decoding unknown kind structurally");
                if let Some(metadata) = mapping.get("metadata")
                    && self.catalog.contains("ObjectMeta")
                {
                    consumed.insert("metadata".to_string());
                    let meta = FieldType::Record("ObjectMeta".to_string());
                    let node = self.value(&meta, metadata, "metadata")?;
                    fields.push(Field::new("metadata", node));
                }
                self.undeclared_fields(mapping, "", &consumed, true, &mut fields)?;
            }
            None => {
                return Err(DecodeError::UnknownKind {
                    document: self.document,
                    kind: kind.to_string(),
                });
            }
        }

        debug!(document = self.document, kind, "decoded object");
        Ok(SourceObject::new(Record {
            type_name: kind.to_string(),
            fields,
        }))
    }

    fn record(
        &self,
        type_name: &str,
        mapping: &Mapping,
        path: &str,
    ) -> Result<Record, DecodeError> {
        let declared = self.catalog.get(type_name).unwrap_or_default();
        let mut consumed = HashSet::new();
        let mut fields = Vec::new();
        self.declared_fields(declared, mapping, path, &mut consumed, &mut fields)?;
        self.undeclared_fields(mapping, path, &consumed, false, &mut fields)?;
        Ok(Record {
            type_name: type_name.to_string(),
            fields,
        })
    }

    /// Catalog fields in declaration order. Inline fields are built from the
    /// same mapping and only appear when they picked up at least one key.
    fn declared_fields(
        &self,
        declared: &[CatalogField],
        mapping: &Mapping,
        path: &str,
        consumed: &mut HashSet<String>,
        out: &mut Vec<Field>,
    ) -> Result<(), DecodeError> {
        for field in declared {
            if field.inline {
                let FieldType::Record(type_name) = &field.ty else {
                    continue;
                };
                let mut embedded = Vec::new();
                let inner = self.catalog.get(type_name).unwrap_or_default();
                self.declared_fields(inner, mapping, path, consumed, &mut embedded)?;
                if embedded.is_empty() {
                    continue;
                }
                let record = Record {
                    type_name: type_name.clone(),
                    fields: embedded,
                };
                out.push(flagged(Field::new(&field.name, record).inline(), field));
                continue;
            }

            let Some(value) = mapping.get(field.name.as_str()) else {
                continue;
            };
            consumed.insert(field.name.clone());
            let node = self.value(&field.ty, value, &join(path, &field.name))?;
            out.push(flagged(Field::new(&field.name, node), field));
        }
        Ok(())
    }

    /// Keys the catalog does not describe, in document order. `tagged` gives
    /// them metadata named after the key.
    fn undeclared_fields(
        &self,
        mapping: &Mapping,
        path: &str,
        consumed: &HashSet<String>,
        tagged: bool,
        out: &mut Vec<Field>,
    ) -> Result<(), DecodeError> {
        for (key, value) in mapping {
            let key = self.key(key, path)?;
            if consumed.contains(&key) {
                continue;
            }
            let node = self.structural(value, &join(path, &key))?;
            if tagged {
                out.push(Field::new(key, node));
            } else {
                debug!(document = self.document, path, key = %key, "key not in catalog");
                out.push(Field::untagged(key, node));
            }
        }
        Ok(())
    }

    fn value(&self, ty: &FieldType, value: &Value, path: &str) -> Result<SourceNode, DecodeError> {
        let value = untag(value);
        match (ty, value) {
            (_, Value::Null) => Ok(SourceNode::Null),
            (FieldType::Any, value) => self.structural(value, path),
            (FieldType::String, Value::String(s)) => Ok(s.as_str().into()),
            (FieldType::Bool, Value::Bool(b)) => Ok((*b).into()),
            (FieldType::Int, Value::Number(n)) => n
                .as_i64()
                .map(SourceNode::from)
                .ok_or_else(|| self.mismatch(ty, value, path)),
            (FieldType::Float, Value::Number(n)) => n
                .as_f64()
                .map(SourceNode::from)
                .ok_or_else(|| self.mismatch(ty, value, path)),
            (FieldType::Quantity, Value::String(s)) => self.quantity(s, path),
            (FieldType::Quantity, Value::Number(n)) => self.quantity(&n.to_string(), path),
            (FieldType::IntOrString, Value::Number(n)) => n
                .as_i64()
                .map(|i| IntOrString::Int(i).into())
                .ok_or_else(|| self.mismatch(ty, value, path)),
            (FieldType::IntOrString, Value::String(s)) => {
                Ok(IntOrString::String(s.clone()).into())
            }
            (
                FieldType::Opaque(type_name),
                Value::String(_) | Value::Number(_) | Value::Bool(_),
            ) => {
                let text = scalar_text(value).unwrap_or_default();
                Ok(SourceNode::Scalar(Scalar::Wrapper(Wrapper::Opaque {
                    type_name: type_name.clone(),
                    text,
                })))
            }
            (FieldType::List(inner), Value::Sequence(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| self.value(inner, item, &format!("{path}[{i}]")))
                .collect::<Result<Vec<_>, _>>()
                .map(SourceNode::Sequence),
            (FieldType::Map(inner), Value::Mapping(entries)) => {
                let mut map = IndexMap::new();
                for (key, value) in entries {
                    let key = self.key(key, path)?;
                    let node = self.value(inner, value, &join(path, &key))?;
                    map.insert(key, node);
                }
                Ok(SourceNode::Mapping(map))
            }
            (FieldType::Record(type_name), Value::Mapping(mapping)) => {
                self.record(type_name, mapping, path).map(SourceNode::from)
            }
            _ => Err(self.mismatch(ty, value, path)),
        }
    }

    /// Decode without a type: mappings become records whose fields are named
    /// after their keys.
    fn structural(&self, value: &Value, path: &str) -> Result<SourceNode, DecodeError> {
        Ok(match value {
            Value::Tagged(tagged) => return self.structural(&tagged.value, path),
            Value::Null => SourceNode::Null,
            Value::Bool(b) => (*b).into(),
            Value::Number(n) => match n.as_i64() {
                Some(i) => i.into(),
                None => n.as_f64().unwrap_or_default().into(),
            },
            Value::String(s) => s.as_str().into(),
            Value::Sequence(items) => SourceNode::Sequence(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.structural(item, &format!("{path}[{i}]")))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Mapping(mapping) => {
                let mut record = Record::new("");
                for (key, value) in mapping {
                    let key = self.key(key, path)?;
                    let node = self.structural(value, &join(path, &key))?;
                    record.push(Field::new(key, node));
                }
                record.into()
            }
        })
    }

    fn quantity(&self, text: &str, path: &str) -> Result<SourceNode, DecodeError> {
        Quantity::parse(text)
            .map(SourceNode::from)
            .map_err(|source| DecodeError::InvalidQuantity {
                document: self.document,
                path: path.to_string(),
                source,
            })
    }

    fn key(&self, key: &Value, path: &str) -> Result<String, DecodeError> {
        scalar_text(untag(key)).ok_or_else(|| DecodeError::TypeMismatch {
            document: self.document,
            path: path.to_string(),
            expected: "a scalar key".to_string(),
            found: describe(key),
        })
    }

    fn mismatch(&self, ty: &FieldType, value: &Value, path: &str) -> DecodeError {
        DecodeError::TypeMismatch {
            document: self.document,
            path: path.to_string(),
            expected: ty.to_string(),
            found: describe(value),
        }
    }
}

fn flagged(decoded: Field, declared: &CatalogField) -> Field {
    if declared.required {
        decoded.required()
    } else {
        decoded
    }
}

fn untag(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untag(&tagged.value),
        value => value,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}
