use indexmap::IndexMap;

use crate::quantity::Quantity;

/// Declared metadata of a record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMeta {
    /// Name used on the wire (`containerPort`, `volumeMounts`).
    pub wire_name: String,
    /// The field's structure is flattened into the enclosing record.
    pub inline: bool,
    pub required: bool,
}

impl FieldMeta {
    pub fn new(wire_name: impl Into<String>) -> Self {
        Self {
            wire_name: wire_name.into(),
            inline: false,
            required: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Raw identifier of the field in its record type.
    pub name: String,
    pub meta: Option<FieldMeta>,
    pub value: SourceNode,
}

impl Field {
    /// A field whose raw name and wire name coincide.
    pub fn new(wire_name: impl Into<String>, value: impl Into<SourceNode>) -> Self {
        let wire_name = wire_name.into();
        Self {
            name: wire_name.clone(),
            meta: Some(FieldMeta::new(wire_name)),
            value: value.into(),
        }
    }

    /// A field without declared metadata.
    pub fn untagged(name: impl Into<String>, value: impl Into<SourceNode>) -> Self {
        Self {
            name: name.into(),
            meta: None,
            value: value.into(),
        }
    }

    pub fn inline(mut self) -> Self {
        self.meta
            .get_or_insert_with(|| FieldMeta::new(self.name.clone()))
            .inline = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.meta
            .get_or_insert_with(|| FieldMeta::new(self.name.clone()))
            .required = true;
        self
    }

    pub fn wire_name(&self) -> Option<&str> {
        self.meta.as_ref().map(|meta| meta.wire_name.as_str())
    }

    /// Wire name, or the raw name when no metadata was declared.
    pub fn key(&self) -> &str {
        self.wire_name().unwrap_or(&self.name)
    }

    pub fn is_inline(&self) -> bool {
        self.meta.as_ref().is_some_and(|meta| meta.inline)
    }
}

/// A named-field structured value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub type_name: String,
    pub fields: Vec<Field>,
}

impl Record {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    pub fn with(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.key() == key)
    }

    pub fn get(&self, key: &str) -> Option<&SourceNode> {
        self.field(key).map(|field| &field.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntOrString {
    Int(i64),
    String(String),
}

impl core::fmt::Display for IntOrString {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

/// Composite source types that translate as a single scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Wrapper {
    Quantity(Quantity),
    IntOrString(IntOrString),
    /// A wrapper type without a dedicated conversion, carried as text.
    Opaque { type_name: String, text: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Wrapper(Wrapper),
}

impl Scalar {
    /// Whether the value is its type's zero value. Wrappers are never zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Self::String(s) => s.is_empty(),
            Self::Bool(b) => !b,
            Self::Int(i) => *i == 0,
            Self::Float(f) => *f == 0.0,
            Self::Wrapper(_) => false,
        }
    }
}

/// Structural shape of a [`SourceNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeShape {
    Null,
    Scalar,
    Record,
    Sequence,
    Mapping,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SourceNode {
    #[default]
    Null,
    Scalar(Scalar),
    Record(Record),
    Sequence(Vec<SourceNode>),
    Mapping(IndexMap<String, SourceNode>),
}

impl SourceNode {
    pub fn sequence(items: impl IntoIterator<Item = impl Into<SourceNode>>) -> Self {
        Self::Sequence(items.into_iter().map(Into::into).collect())
    }

    pub fn mapping<K: Into<String>, V: Into<SourceNode>>(
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        Self::Mapping(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn shape(&self) -> NodeShape {
        match self {
            Self::Null => NodeShape::Null,
            Self::Scalar(_) => NodeShape::Scalar,
            Self::Record(_) => NodeShape::Record,
            Self::Sequence(_) => NodeShape::Sequence,
            Self::Mapping(_) => NodeShape::Mapping,
        }
    }

    /// Zero values are skipped when translating. Records are never zero here;
    /// whether they carry a value is only known after visiting them.
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Scalar(scalar) => scalar.is_zero(),
            Self::Record(_) => false,
            Self::Sequence(items) => items.is_empty(),
            Self::Mapping(entries) => entries.is_empty(),
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for SourceNode {
    fn from(s: &str) -> Self {
        Self::Scalar(Scalar::String(s.to_string()))
    }
}

impl From<String> for SourceNode {
    fn from(s: String) -> Self {
        Self::Scalar(Scalar::String(s))
    }
}

impl From<bool> for SourceNode {
    fn from(b: bool) -> Self {
        Self::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for SourceNode {
    fn from(i: i64) -> Self {
        Self::Scalar(Scalar::Int(i))
    }
}

impl From<i32> for SourceNode {
    fn from(i: i32) -> Self {
        Self::Scalar(Scalar::Int(i.into()))
    }
}

impl From<f64> for SourceNode {
    fn from(f: f64) -> Self {
        Self::Scalar(Scalar::Float(f))
    }
}

impl From<Quantity> for SourceNode {
    fn from(q: Quantity) -> Self {
        Self::Scalar(Scalar::Wrapper(Wrapper::Quantity(q)))
    }
}

impl From<IntOrString> for SourceNode {
    fn from(v: IntOrString) -> Self {
        Self::Scalar(Scalar::Wrapper(Wrapper::IntOrString(v)))
    }
}

impl From<Record> for SourceNode {
    fn from(record: Record) -> Self {
        Self::Record(record)
    }
}

/// One decoded resource.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceObject {
    pub root: SourceNode,
}

impl SourceObject {
    pub fn new(root: impl Into<SourceNode>) -> Self {
        Self { root: root.into() }
    }

    /// Resource kind from the root `kind` field, falling back to the root
    /// record's type name.
    pub fn kind(&self) -> Option<&str> {
        let record = self.root.as_record()?;
        record
            .get("kind")
            .and_then(SourceNode::as_str)
            .or(Some(record.type_name.as_str()))
            .filter(|kind| !kind.is_empty())
    }

    /// `metadata.name` of the resource.
    pub fn name(&self) -> Option<&str> {
        self.root
            .as_record()?
            .get("metadata")
            .and_then(SourceNode::as_record)
            .and_then(|meta| meta.get("name"))
            .and_then(SourceNode::as_str)
    }
}
