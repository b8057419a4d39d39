use indexmap::IndexMap;
use k2tf_document::Value;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::source::{Scalar, SourceNode, Wrapper};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRules {
    /// Fields rendered as octal file modes wherever they appear.
    pub octal_fields: Vec<String>,
    /// `(sequence, field)` pairs rendered as octal inside that sequence only.
    pub octal_fields_in_sequence: Vec<(String, String)>,
}

impl Default for ConversionRules {
    fn default() -> Self {
        Self {
            octal_fields: vec!["defaultMode".into()],
            octal_fields_in_sequence: vec![("items".into(), "mode".into())],
        }
    }
}

/// Where a scalar sits in the source graph.
#[derive(Debug, Clone, Copy)]
pub struct ScalarSite<'a> {
    /// Wire name of the field holding the value.
    pub field: &'a str,
    /// Wire name of the enclosing sequence field, if any.
    pub sequence: Option<&'a str>,
    /// Schema path used in diagnostics.
    pub path: &'a str,
}

/// Maps source scalars to target values. Never fails; unknown wrappers fall
/// back to their text with a note.
#[derive(Debug, Clone, Default)]
pub struct ValueConverter {
    rules: ConversionRules,
}

impl ValueConverter {
    pub fn new(rules: ConversionRules) -> Self {
        Self { rules }
    }

    fn is_octal(&self, site: &ScalarSite<'_>) -> bool {
        self.rules.octal_fields.iter().any(|f| f == site.field)
            || site.sequence.is_some_and(|sequence| {
                self.rules
                    .octal_fields_in_sequence
                    .iter()
                    .any(|(seq, field)| seq == sequence && field == site.field)
            })
    }

    pub fn convert_scalar(
        &self,
        scalar: &Scalar,
        site: &ScalarSite<'_>,
        diagnostics: &mut Diagnostics,
    ) -> Value {
        match scalar {
            Scalar::Int(i) if *i >= 0 && self.is_octal(site) => Value::String(format!("0{i:o}")),
            Scalar::String(s) => Value::String(s.clone()),
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Int(i) => Value::Int(*i),
            Scalar::Float(f) => Value::Float(*f),
            Scalar::Wrapper(Wrapper::Quantity(q)) => Value::String(q.to_string()),
            Scalar::Wrapper(Wrapper::IntOrString(v)) => Value::String(v.to_string()),
            Scalar::Wrapper(Wrapper::Opaque { type_name, text }) => {
                diagnostics.record(
                    DiagnosticKind::UnhandledScalar,
                    site.path,
                    format!("unhandled scalar type {type_name}, written as text"),
                );
                Value::String(text.clone())
            }
        }
    }

    /// Convert any value held by a mapping entry or a scalar sequence. `None`
    /// for null.
    pub fn convert(
        &self,
        node: &SourceNode,
        site: &ScalarSite<'_>,
        diagnostics: &mut Diagnostics,
    ) -> Option<Value> {
        match node {
            SourceNode::Null => None,
            SourceNode::Scalar(scalar) => Some(self.convert_scalar(scalar, site, diagnostics)),
            SourceNode::Sequence(items) => Some(Value::List(
                items
                    .iter()
                    .filter_map(|item| self.convert(item, site, diagnostics))
                    .collect(),
            )),
            SourceNode::Mapping(entries) => Some(Value::Object(
                entries
                    .iter()
                    .filter_map(|(key, value)| {
                        let value = self.convert(value, site, diagnostics)?;
                        Some((key.clone(), value))
                    })
                    .collect(),
            )),
            SourceNode::Record(record) => {
                let mut object = IndexMap::new();
                for field in &record.fields {
                    let site = ScalarSite {
                        field: field.key(),
                        ..*site
                    };
                    if let Some(value) = self.convert(&field.value, &site, diagnostics) {
                        object.insert(field.key().to_string(), value);
                    }
                }
                Some(Value::Object(object))
            }
        }
    }
}
