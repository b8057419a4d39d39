use super::*;
use k2tf::{IntOrString, Quantity, Record, Scalar, SourceNode, Wrapper};
use pretty_assertions::assert_eq;

fn decode(yaml: &str) -> Decoded {
    decode_str(yaml, Catalog::builtin())
}

fn root(decoded: &Decoded, index: usize) -> &Record {
    decoded.objects[index].root.as_record().unwrap()
}

fn record<'a>(record: &'a Record, key: &str) -> &'a Record {
    record.get(key).and_then(SourceNode::as_record).unwrap()
}

fn keys(record: &Record) -> Vec<&str> {
    record.fields.iter().map(|field| field.key()).collect()
}

const DEPLOYMENT: &str = r#"
kind: Deployment
apiVersion: apps/v1
spec:
  template:
    spec:
      containers:
        - image: nginx:1.25
          name: nginx
          resources:
            limits:
              cpu: 2
              memory: 512Mi
  replicas: 3
metadata:
  name: web
  labels:
    app: web
"#;

#[test]
fn test_fields_follow_declaration_order() {
    let decoded = decode(DEPLOYMENT);
    assert!(decoded.errors.is_empty());
    let deployment = root(&decoded, 0);
    assert_eq!(deployment.type_name, "Deployment");
    assert_eq!(keys(deployment), ["apiVersion", "kind", "metadata", "spec"]);
    assert_eq!(keys(record(deployment, "spec")), ["replicas", "template"]);

    let metadata = record(deployment, "metadata");
    assert_eq!(metadata.type_name, "ObjectMeta");
    assert_eq!(
        metadata.get("labels"),
        Some(&SourceNode::mapping([("app", "web")]))
    );
}

#[test]
fn test_declared_types_are_applied() {
    let decoded = decode(DEPLOYMENT);
    let spec = record(root(&decoded, 0), "spec");
    assert_eq!(spec.get("replicas"), Some(&SourceNode::from(3)));

    let pod = record(record(spec, "template"), "spec");
    let Some(SourceNode::Sequence(containers)) = pod.get("containers") else {
        panic!("containers should be a sequence");
    };
    let container = containers[0].as_record().unwrap();
    assert_eq!(keys(container), ["name", "image", "resources"]);
    let Some(SourceNode::Mapping(limits)) = record(container, "resources").get("limits") else {
        panic!("limits should be a mapping");
    };
    assert_eq!(limits["cpu"], SourceNode::from(Quantity::parse("2").unwrap()));
    assert_eq!(limits["memory"], SourceNode::from(Quantity::parse("512Mi").unwrap()));
}

#[test]
fn test_required_flags_come_from_the_catalog() {
    let decoded = decode(DEPLOYMENT);
    let spec = record(root(&decoded, 0), "spec");
    assert!(spec.field("template").unwrap().meta.as_ref().unwrap().required);
    assert!(!spec.field("replicas").unwrap().meta.as_ref().unwrap().required);
}

#[test]
fn test_unknown_keys_are_appended_untagged() {
    let decoded = decode(
        r#"
apiVersion: v1
kind: ServiceAccount
customField: value
metadata:
  name: robot
"#,
    );
    let account = root(&decoded, 0);
    assert_eq!(keys(account), ["apiVersion", "kind", "metadata", "customField"]);
    let custom = account.field("customField").unwrap();
    assert_eq!(custom.meta, None);
    assert_eq!(custom.value, SourceNode::from("value"));
}

#[test]
fn test_inline_fields_share_the_parent_mapping() {
    let decoded = decode(
        r#"
apiVersion: v1
kind: Pod
metadata:
  name: app
spec:
  volumes:
    - name: config
      configMap:
        name: settings
        defaultMode: 420
    - name: scratch
"#,
    );
    assert!(decoded.errors.is_empty());
    let Some(SourceNode::Sequence(volumes)) = record(root(&decoded, 0), "spec").get("volumes")
    else {
        panic!("volumes should be a sequence");
    };

    let volume = volumes[0].as_record().unwrap();
    assert_eq!(keys(volume), ["name", "VolumeSource"]);
    assert!(volume.field("VolumeSource").unwrap().is_inline());
    let config_map = record(record(volume, "VolumeSource"), "configMap");
    assert_eq!(keys(config_map), ["LocalObjectReference", "defaultMode"]);
    assert_eq!(
        record(config_map, "LocalObjectReference").get("name"),
        Some(&SourceNode::from("settings"))
    );

    // an inline type without any of its keys present is left out
    let scratch = volumes[1].as_record().unwrap();
    assert_eq!(keys(scratch), ["name"]);
}

#[test]
fn test_multi_document_stream_skips_empty_documents() {
    let decoded = decode(
        r#"---
apiVersion: v1
kind: Namespace
metadata:
  name: team-a
---
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: settings
data:
  key: value
"#,
    );
    assert!(decoded.errors.is_empty());
    let kinds: Vec<_> = decoded.objects.iter().filter_map(|o| o.kind()).collect();
    assert_eq!(kinds, ["Namespace", "ConfigMap"]);
}

#[test]
fn test_list_is_expanded() {
    let decoded = decode(
        r#"
apiVersion: v1
kind: List
items:
  - apiVersion: v1
    kind: Service
    metadata:
      name: api
  - apiVersion: v1
    kind: Secret
    metadata:
      name: token
"#,
    );
    assert!(decoded.errors.is_empty());
    let names: Vec<_> = decoded.objects.iter().filter_map(|o| o.name()).collect();
    assert_eq!(names, ["api", "token"]);
}

#[test]
fn test_list_items_must_be_a_sequence() {
    let decoded = decode("kind: List\nitems: nope\n");
    assert!(decoded.objects.is_empty());
    assert!(matches!(
        decoded.errors[..],
        [DecodeError::ListItems { document: 1 }]
    ));
}

#[test]
fn test_list_is_kept_when_expansion_is_disabled() {
    let config = Config {
        expand_lists: false,
        ..Config::default()
    };
    let decoded = decode_str_with_config("kind: List\nitems: []\n", Catalog::builtin(), &config);
    assert!(matches!(
        &decoded.errors[..],
        [DecodeError::UnknownKind { kind, .. }] if kind == "List"
    ));
}

#[test]
fn test_errors_are_reported_per_document() {
    let decoded = decode(
        r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: first
---
metadata:
  name: no-kind
---
kind: Widget
---
kind: Deployment
spec:
  replicas: three
---
- just
- a list
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: last
"#,
    );
    let names: Vec<_> = decoded.objects.iter().filter_map(|o| o.name()).collect();
    assert_eq!(names, ["first", "last"]);

    let documents: Vec<_> = decoded.errors.iter().map(DecodeError::document).collect();
    assert_eq!(documents, [2, 3, 4, 5]);
    assert!(matches!(decoded.errors[0], DecodeError::MissingKind { .. }));
    assert!(matches!(
        &decoded.errors[1],
        DecodeError::UnknownKind { kind, .. } if kind == "Widget"
    ));
    assert!(matches!(
        &decoded.errors[2],
        DecodeError::TypeMismatch { path, expected, found: "a string", .. }
            if path == "spec.replicas" && expected == "int"
    ));
    assert!(matches!(decoded.errors[3], DecodeError::NotAMapping { .. }));
}

#[test]
fn test_invalid_quantity() {
    let decoded = decode(
        r#"
kind: ResourceQuota
metadata:
  name: quota
spec:
  hard:
    cpu: lots
"#,
    );
    assert!(matches!(
        &decoded.errors[..],
        [DecodeError::InvalidQuantity { path, .. }] if path == "spec.hard.cpu"
    ));
}

#[test]
fn test_invalid_yaml_ends_the_stream() {
    let decoded = decode("kind: ConfigMap\nmetadata: {name: a\n");
    assert!(decoded.objects.is_empty());
    assert!(matches!(decoded.errors[..], [DecodeError::Yaml { document: 1, .. }]));
}

#[test]
fn test_int_or_string_and_opaque_values() {
    let decoded = decode(
        r#"
kind: Service
metadata:
  name: api
  creationTimestamp: "2024-01-01T00:00:00Z"
spec:
  ports:
    - port: 80
      targetPort: http
    - port: 443
      targetPort: 8443
"#,
    );
    let service = root(&decoded, 0);
    let Some(SourceNode::Sequence(ports)) = record(service, "spec").get("ports") else {
        panic!("ports should be a sequence");
    };
    let target = |i: usize| ports[i].as_record().unwrap().get("targetPort").cloned();
    assert_eq!(target(0), Some(IntOrString::String("http".to_string()).into()));
    assert_eq!(target(1), Some(IntOrString::Int(8443).into()));

    assert_eq!(
        record(service, "metadata").get("creationTimestamp"),
        Some(&SourceNode::Scalar(Scalar::Wrapper(Wrapper::Opaque {
            type_name: "Time".to_string(),
            text: "2024-01-01T00:00:00Z".to_string(),
        })))
    );
}

#[test]
fn test_unknown_kinds_decode_structurally_when_allowed() {
    let config = Config {
        allow_unknown_kinds: true,
        ..Config::default()
    };
    let decoded = decode_str_with_config(
        r#"
apiVersion: example.com/v1
kind: Widget
metadata:
  name: gear
spec:
  size: 3
  parts:
    - name: cog
"#,
        Catalog::builtin(),
        &config,
    );
    assert!(decoded.errors.is_empty());
    let widget = root(&decoded, 0);
    assert_eq!(decoded.objects[0].name(), Some("gear"));
    assert_eq!(record(widget, "metadata").type_name, "ObjectMeta");

    let spec = record(widget, "spec");
    assert_eq!(spec.field("size").unwrap().wire_name(), Some("size"));
    assert_eq!(spec.get("size"), Some(&SourceNode::from(3)));
    let Some(SourceNode::Sequence(parts)) = spec.get("parts") else {
        panic!("parts should be a sequence");
    };
    assert_eq!(
        parts[0].as_record().unwrap().get("name"),
        Some(&SourceNode::from("cog"))
    );
}
