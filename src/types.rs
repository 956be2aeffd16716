//! Core grants types: actions, possessions, access and query records

use crate::error::ModelError;
use crate::validate::split_names;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// CRUD action performed on a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Create a new resource instance
    Create,
    /// Read resource data
    Read,
    /// Update resource data
    Update,
    /// Delete a resource instance
    Delete,
}

impl Action {
    /// All canonical actions
    pub const ALL: [Action; 4] = [Action::Create, Action::Read, Action::Update, Action::Delete];

    /// Wire/string form of the action
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl FromStr for Action {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(Action::Create),
            "read" => Ok(Action::Read),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            _ => Err(ModelError::InvalidAction(s.trim().to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scope of an action: the caller's own instances or any instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Possession {
    /// Only the caller's own resource instances
    Own,
    /// All instances; subsumes `Own`
    Any,
}

impl Possession {
    /// Wire/string form of the possession
    pub fn as_str(&self) -> &'static str {
        match self {
            Possession::Own => "own",
            Possession::Any => "any",
        }
    }
}

impl FromStr for Possession {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "own" => Ok(Possession::Own),
            "any" => Ok(Possession::Any),
            _ => Err(ModelError::InvalidPossession(s.trim().to_string())),
        }
    }
}

impl fmt::Display for Possession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access record: the unit committed into the grants model
///
/// Role, resource and attribute inputs accept either a list or a single
/// comma/semicolon-separated string; both forms are canonicalized to a
/// `Vec<String>` at this boundary, before any validation runs.
///
/// `action` may carry an inline possession (`"read:own"`); an explicit
/// `possession` field takes precedence over the inline one. When neither is
/// given, possession defaults to `any`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessInfo {
    /// Role name(s) receiving the grant
    #[serde(default, deserialize_with = "de_name_list")]
    pub role: Vec<String>,

    /// Resource name(s) the grant applies to
    #[serde(default, deserialize_with = "de_name_list")]
    pub resource: Vec<String>,

    /// Action name, optionally `"<action>:<possession>"`
    #[serde(default)]
    pub action: String,

    /// Explicit possession, overriding any inline `action` possession
    #[serde(default)]
    pub possession: Option<String>,

    /// Allowed attribute patterns; `None` defaults to `["*"]` unless denied
    #[serde(default, deserialize_with = "de_opt_name_list")]
    pub attributes: Option<Vec<String>>,

    /// Denied records always commit an empty attribute list
    #[serde(default)]
    pub denied: bool,
}

impl AccessInfo {
    /// Create an access record for the given role(s), resource(s) and action.
    ///
    /// `role` and `resource` may be single names or comma/semicolon-separated
    /// lists.
    pub fn new(
        role: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            role: split_names(&role.into()),
            resource: split_names(&resource.into()),
            action: action.into(),
            possession: None,
            attributes: None,
            denied: false,
        }
    }

    /// Set an explicit possession
    pub fn with_possession(mut self, possession: impl Into<String>) -> Self {
        self.possession = Some(possession.into());
        self
    }

    /// Set the allowed attribute patterns
    pub fn with_attributes(mut self, attributes: Vec<String>) -> Self {
        self.attributes = Some(attributes);
        self
    }

    /// Mark the record as a deny
    pub fn denied(mut self) -> Self {
        self.denied = true;
        self
    }
}

/// Permission query: role(s), resource, action, optional possession
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryInfo {
    /// Role name(s); the query is granted if any role in the union grants it
    #[serde(default, deserialize_with = "de_name_list")]
    pub role: Vec<String>,

    /// Resource name being queried
    #[serde(default)]
    pub resource: String,

    /// Action name, optionally `"<action>:<possession>"`
    #[serde(default)]
    pub action: String,

    /// Explicit possession, overriding any inline `action` possession
    #[serde(default)]
    pub possession: Option<String>,
}

impl QueryInfo {
    /// Create a query for the given role(s), resource and action
    pub fn new(
        role: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            role: split_names(&role.into()),
            resource: resource.into(),
            action: action.into(),
            possession: None,
        }
    }

    /// Create a query over multiple roles
    pub fn roles(roles: &[&str], resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            role: roles.iter().map(|r| r.to_string()).collect(),
            resource: resource.into(),
            action: action.into(),
            possession: None,
        }
    }

    /// Set an explicit possession
    pub fn with_possession(mut self, possession: impl Into<String>) -> Self {
        self.possession = Some(possession.into());
        self
    }
}

/// Deserialize a string (split on `,`/`;`) or a list of strings
fn de_name_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::One(s) => split_names(&s),
        Raw::Many(v) => v,
    })
}

fn de_opt_name_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        One(String),
        Many(Vec<String>),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::One(s) => split_names(&s),
        Raw::Many(v) => v,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_parsing() {
        assert_eq!("create".parse::<Action>().unwrap(), Action::Create);
        assert_eq!(" READ ".parse::<Action>().unwrap(), Action::Read);
        assert!("execute".parse::<Action>().is_err());
    }

    #[test]
    fn test_possession_parsing() {
        assert_eq!("own".parse::<Possession>().unwrap(), Possession::Own);
        assert_eq!("Any".parse::<Possession>().unwrap(), Possession::Any);
        assert!("all".parse::<Possession>().is_err());
    }

    #[test]
    fn test_access_info_builder() {
        let access = AccessInfo::new("admin, user", "video", "create")
            .with_possession("own")
            .with_attributes(vec!["*".to_string()]);

        assert_eq!(access.role, vec!["admin", "user"]);
        assert_eq!(access.resource, vec!["video"]);
        assert_eq!(access.possession.as_deref(), Some("own"));
        assert!(!access.denied);
    }

    #[test]
    fn test_access_info_from_json() {
        let access: AccessInfo = serde_json::from_value(serde_json::json!({
            "role": "editor;viewer",
            "resource": ["video", "photo"],
            "action": "read:own",
            "attributes": "title, id"
        }))
        .unwrap();

        assert_eq!(access.role, vec!["editor", "viewer"]);
        assert_eq!(access.resource, vec!["video", "photo"]);
        assert_eq!(access.action, "read:own");
        assert_eq!(
            access.attributes,
            Some(vec!["title".to_string(), "id".to_string()])
        );
    }

    #[test]
    fn test_query_info_roles() {
        let query = QueryInfo::roles(&["admin", "user"], "video", "create");
        assert_eq!(query.role, vec!["admin", "user"]);
        assert_eq!(query.resource, "video");
    }
}
