use crate::convert::ConversionRules;
use crate::naming::NamingRules;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Keep attributes and blocks the target schema does not know.
    pub include_unsupported: bool,
    /// Wire names that are never translated.
    pub ignored_fields: Vec<String>,
    /// Wire names skipped on the resource itself only (type metadata).
    pub ignored_root_fields: Vec<String>,
    /// Wire names whose zero or empty values are still written.
    pub include_on_zero: Vec<String>,
    /// Prepended to the normalized kind to form the resource type.
    pub resource_prefix: String,
    pub naming: NamingRules,
    pub conversion: ConversionRules,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            include_unsupported: false,
            ignored_fields: [
                "status",
                "creationTimestamp",
                "deletionTimestamp",
                "generation",
                "ownerReferences",
                "resourceVersion",
                "selfLink",
                "uid",
                "managedFields",
            ]
            .map(String::from)
            .to_vec(),
            ignored_root_fields: ["apiVersion", "kind"].map(String::from).to_vec(),
            include_on_zero: ["runAsUser", "emptyDir"].map(String::from).to_vec(),
            resource_prefix: "kubernetes_".to_string(),
            naming: NamingRules::default(),
            conversion: ConversionRules::default(),
        }
    }
}

impl EngineConfig {
    pub fn is_ignored(&self, wire_name: &str, at_root: bool) -> bool {
        self.ignored_fields.iter().any(|f| f == wire_name)
            || (at_root && self.ignored_root_fields.iter().any(|f| f == wire_name))
    }

    pub fn is_included_on_zero(&self, wire_name: &str) -> bool {
        self.include_on_zero.iter().any(|f| f == wire_name)
    }
}
