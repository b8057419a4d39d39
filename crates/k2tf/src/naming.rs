//! Mapping of Kubernetes field identifiers to Terraform names.

use std::sync::LazyLock;

use convert_case::{Case, Casing};
use regex::Regex;

use crate::error::NamingError;

/// Where a [`NameOverride`] applies, tested against the context path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathCondition {
    Always,
    Contains(String),
    NotContains(String),
}

impl PathCondition {
    fn matches(&self, path: &str) -> bool {
        match self {
            Self::Always => true,
            Self::Contains(needle) => path.contains(needle.as_str()),
            Self::NotContains(needle) => !path.contains(needle.as_str()),
        }
    }
}

/// Replaces `raw` with `target` when the condition holds, skipping every other
/// rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameOverride {
    pub raw: String,
    pub condition: PathCondition,
    pub target: String,
}

impl NameOverride {
    pub fn new(raw: &str, condition: PathCondition, target: &str) -> Self {
        Self {
            raw: raw.to_string(),
            condition,
            target: target.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingRules {
    pub overrides: Vec<NameOverride>,
    /// Patterns of names that singularization leaves alone, matched
    /// case-insensitively against the end of the name.
    pub singular_exceptions: Vec<String>,
    /// Words without a singular form, matched case-insensitively against the
    /// end of the name.
    pub uncountables: Vec<String>,
}

impl Default for NamingRules {
    fn default() -> Self {
        use PathCondition::*;
        Self {
            overrides: vec![
                NameOverride::new("DaemonSet", Always, "daemonset"),
                NameOverride::new(
                    "nonResourceURLs",
                    Contains("role.rule".into()),
                    "non_resource_urls",
                ),
                NameOverride::new(
                    "updateStrategy",
                    NotContains("stateful".into()),
                    "strategy",
                ),
                NameOverride::new("limits", Contains("limit_range.spec".into()), "limit"),
                NameOverride::new(
                    "ports",
                    Contains("kubernetes_network_policy.spec".into()),
                    "ports",
                ),
                NameOverride::new(
                    "externalIPs",
                    Contains("kubernetes_service.spec".into()),
                    "external_ips",
                ),
            ],
            singular_exceptions: [
                "annotations",
                ".*labels",
                "limits",
                "resources",
                "requests",
                "imagePullSecrets",
                "capabilities",
                "clusterRoleSelectors",
                "matchExpressions",
                "parameters",
            ]
            .map(String::from)
            .to_vec(),
            uncountables: ["data", "metadata", "items", "tls"]
                .map(String::from)
                .to_vec(),
        }
    }
}

/// Singular rules in priority order, the first match wins.
static SINGULAR_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        // irregular
        ("people$", "person"),
        ("men$", "man"),
        ("children$", "child"),
        ("sexes$", "sex"),
        ("moves$", "move"),
        ("mombies$", "mombie"),
        // regular
        ("(database)s$", "${1}"),
        ("(quiz)zes$", "${1}"),
        ("(matr)ices$", "${1}ix"),
        ("(vert|ind)ices$", "${1}ex"),
        ("^(ox)en", "${1}"),
        ("(alias|status)(es)?$", "${1}"),
        ("(octop|vir)(us|i)$", "${1}us"),
        ("^(a)x[ie]s$", "${1}xis"),
        ("(cris|test)(is|es)$", "${1}is"),
        ("(shoe)s$", "${1}"),
        ("(o)es$", "${1}"),
        ("(bus|campus)(es)?$", "${1}"),
        ("^(m|l)ice$", "${1}ouse"),
        ("(x|ch|ss|sh)es$", "${1}"),
        ("(c)ookies$", "${1}ookie"),
        ("(m)ovies$", "${1}ovie"),
        ("(s)eries$", "${1}eries"),
        ("([^aeiouy]|qu)ies$", "${1}y"),
        ("([lr])ves$", "${1}f"),
        ("(tive)s$", "${1}"),
        ("(hive)s$", "${1}"),
        ("([^f])ves$", "${1}fe"),
        ("(^analy)(sis|ses)$", "${1}sis"),
        (
            "((a)naly|(b)a|(d)iagno|(p)arenthe|(p)rogno|(s)ynop|(t)he)(sis|ses)$",
            "${1}sis",
        ),
        ("([ti])a$", "${1}um"),
        ("(n)ews$", "${1}ews"),
        ("(ss)$", "${1}"),
        ("s$", ""),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        let regex = Regex::new(&format!("(?i){pattern}")).expect("invalid singular rule");
        (regex, replacement)
    })
    .collect()
});

/// Normalizes source identifiers into target identifiers.
#[derive(Debug, Clone)]
pub struct NameMapper {
    overrides: Vec<NameOverride>,
    exceptions: Vec<Regex>,
    uncountables: Vec<Regex>,
}

impl Default for NameMapper {
    fn default() -> Self {
        Self::new(&NamingRules::default()).expect("default naming rules are valid")
    }
}

impl NameMapper {
    pub fn new(rules: &NamingRules) -> Result<Self, NamingError> {
        let compile = |pattern: String| {
            Regex::new(&pattern).map_err(|source| NamingError::InvalidPattern { pattern, source })
        };
        let exceptions = rules
            .singular_exceptions
            .iter()
            .map(|p| compile(format!("(?i)(?:{p})$")))
            .collect::<Result<_, _>>()?;
        let uncountables = rules
            .uncountables
            .iter()
            .map(|word| compile(format!("(?i){}$", regex::escape(word))))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            overrides: rules.overrides.clone(),
            exceptions,
            uncountables,
        })
    }

    /// Map `raw` to a target identifier. Overrides win outright, then the name
    /// is optionally singularized, snake-cased, and stripped of `:`.
    pub fn normalize(&self, raw: &str, to_singular: bool, context_path: &str) -> String {
        if let Some(rule) = self
            .overrides
            .iter()
            .find(|rule| rule.raw == raw && rule.condition.matches(context_path))
        {
            return rule.target.clone();
        }

        let name = if to_singular {
            self.singularize(raw)
        } else {
            raw.to_string()
        };
        name.to_case(Case::Snake).replace(':', "_")
    }

    pub fn singularize(&self, word: &str) -> String {
        if self
            .exceptions
            .iter()
            .chain(&self.uncountables)
            .any(|re| re.is_match(word))
        {
            return word.to_string();
        }
        SINGULAR_RULES
            .iter()
            .find(|(re, _)| re.is_match(word))
            .map(|(re, replacement)| re.replace(word, *replacement).into_owned())
            .unwrap_or_else(|| word.to_string())
    }

    pub fn attribute_name(&self, wire_name: &str, path: &str) -> String {
        self.normalize(wire_name, false, path)
    }

    pub fn block_name(&self, wire_name: &str, path: &str) -> String {
        self.normalize(wire_name, true, path)
    }

    /// Terraform resource type for a Kubernetes kind, e.g. `kubernetes_deployment`.
    pub fn resource_type(&self, prefix: &str, kind: &str) -> String {
        format!("{prefix}{}", self.normalize(kind, false, ""))
    }

    pub fn resource_name(&self, name: &str) -> String {
        self.normalize(name, false, "")
    }
}

/// Quote map keys that cannot be written as bare identifiers.
pub fn map_key(key: &str) -> String {
    if key.contains(['/', '.']) {
        format!("\"{key}\"")
    } else {
        key.to_string()
    }
}
