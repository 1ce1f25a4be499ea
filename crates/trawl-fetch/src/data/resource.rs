use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use trawl_state::CheckpointKey;
use trawl_store::IdentityStrategy;

/// Everything the page loop needs to know about one remote resource type.
#[derive(Debug, Clone)]
pub struct Resource {
    pub name:            String,
    /// Path of the paginated listing endpoint, relative to the API base URL.
    pub endpoint:        String,
    /// Record field holding the modification timestamp.
    pub timestamp_field: String,
    pub identity:        IdentityStrategy,
    /// Extra request-body fields sent with every page request.
    pub expansions:      Map<String, Value>,
}

impl Resource {
    pub fn contacts(expansions: ContactExpansions) -> Self {
        Self {
            name:            "contacts".to_string(),
            endpoint:        "/api/Contacts/List".to_string(),
            timestamp_field: "lastmodified".to_string(),
            identity:        IdentityStrategy::internal_id(),
            expansions:      expansions.into_body(),
        }
    }

    pub fn with_identity(mut self, identity: IdentityStrategy) -> Self {
        self.identity = identity;
        self
    }

    pub fn checkpoint_key(&self) -> CheckpointKey { CheckpointKey::new(&self.name, self.identity.version()) }
}

/// Which contacts appear in `relationship_metrics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsScope {
    Internal,
    External,
    All,
}

impl MetricsScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricsScope::Internal => "INTERNAL",
            MetricsScope::External => "EXTERNAL",
            MetricsScope::All => "ALL",
        }
    }
}

impl fmt::Display for MetricsScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for MetricsScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INTERNAL" => Ok(MetricsScope::Internal),
            "EXTERNAL" => Ok(MetricsScope::External),
            "ALL" => Ok(MetricsScope::All),
            _ => Err(format!("unknown metrics scope {s:?}, expected INTERNAL, EXTERNAL or ALL")),
        }
    }
}

/// Optional expansions of the contacts listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactExpansions {
    pub relationship_metrics:         bool,
    pub relationship_metrics_history: bool,
    pub relationship_metrics_type:    Option<MetricsScope>,
}

impl ContactExpansions {
    fn into_body(self) -> Map<String, Value> {
        let mut body = Map::new();
        body.insert(
            "expand_relationship_metrics".to_string(),
            Value::Bool(self.relationship_metrics),
        );
        body.insert(
            "expand_relationship_metrics_history".to_string(),
            Value::Bool(self.relationship_metrics_history),
        );
        // null when unset
        let scope = self
            .relationship_metrics_type
            .map_or(Value::Null, |scope| Value::String(scope.as_str().to_string()));
        body.insert("expand_relationship_metrics_type".to_string(), scope);
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contacts_defaults() {
        let resource = Resource::contacts(ContactExpansions::default());
        assert_eq!(resource.endpoint, "/api/Contacts/List");
        assert_eq!(resource.checkpoint_key().as_str(), "contacts.v2");
        assert_eq!(resource.expansions["expand_relationship_metrics"], Value::Bool(false));
        assert_eq!(resource.expansions["expand_relationship_metrics_type"], Value::Null);
    }

    #[test]
    fn test_identity_switch_changes_checkpoint_key() {
        let resource = Resource::contacts(ContactExpansions::default()).with_identity(IdentityStrategy::email_hash());
        assert_eq!(resource.checkpoint_key().as_str(), "contacts.v1");
    }

    #[test]
    fn test_metrics_scope_parse() {
        assert_eq!("external".parse::<MetricsScope>().unwrap(), MetricsScope::External);
        assert!("some".parse::<MetricsScope>().is_err());
    }

    #[test]
    fn test_expansions_body() {
        let body = ContactExpansions {
            relationship_metrics:         true,
            relationship_metrics_history: false,
            relationship_metrics_type:    Some(MetricsScope::All),
        }
        .into_body();
        assert_eq!(body["expand_relationship_metrics"], Value::Bool(true));
        assert_eq!(body["expand_relationship_metrics_type"], Value::String("ALL".into()));
    }
}
