//! Validation and normalization of raw grants input
//!
//! Accepts either a nested role/resource/action object or a flat list of
//! access records, rejects invalid or reserved names, and produces a
//! canonical [`GrantsModel`]. Also hosts the shared action/possession
//! normalization used by ad hoc access and query records.

use crate::error::{ModelError, Result};
use crate::grants::{GrantsModel, ResourceEntry, RoleEntry};
use crate::types::{AccessInfo, Action, Possession, QueryInfo};
use serde_json::Value;
use tracing::debug;

/// Names that can never be used for a role or resource.
///
/// `$extend` is the serialized key for a role's extension list; `*` and `!`
/// belong to the attribute-pattern grammar.
pub const RESERVED_KEYWORDS: [&str; 4] = ["*", "!", "$", "$extend"];

/// Split a comma/semicolon-separated name string into trimmed parts.
///
/// A plain name yields a single-element list. Empty parts are kept so the
/// filled-string checks downstream can reject them.
pub(crate) fn split_names(value: &str) -> Vec<String> {
    value
        .trim()
        .split(|c| c == ',' || c == ';')
        .map(|s| s.trim().to_string())
        .collect()
}

/// Whether every item is a non-empty string. The list itself may be empty.
pub(crate) fn is_filled(names: &[String]) -> bool {
    names.iter().all(|n| !n.trim().is_empty())
}

/// Whether the name is non-empty and not a reserved keyword
pub(crate) fn name_is_valid(name: &str) -> bool {
    !name.trim().is_empty() && !RESERVED_KEYWORDS.contains(&name)
}

/// Check that the name can be used for a role or resource
pub fn valid_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ModelError::InvalidName);
    }
    if RESERVED_KEYWORDS.contains(&name) {
        return Err(ModelError::ReservedName(name.to_string()));
    }
    Ok(())
}

/// Access record with every field validated and in canonical form
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NormalizedAccess {
    pub roles: Vec<String>,
    pub resources: Vec<String>,
    pub action: Action,
    pub possession: Possession,
    pub attributes: Vec<String>,
}

/// Query with every field validated and in canonical form
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NormalizedQuery {
    pub roles: Vec<String>,
    pub resource: String,
    pub action: Action,
    pub possession: Possession,
}

/// Normalize an action string and optional possession.
///
/// The action may carry an inline possession (`"read:own"`); an explicit
/// possession wins over the inline one. Both parts are trimmed and
/// lower-cased; possession defaults to `any` when absent from both.
pub fn normalize_action_possession(
    action: &str,
    possession: Option<&str>,
) -> Result<(Action, Possession)> {
    let mut parts = action.splitn(2, ':');
    let action: Action = parts.next().unwrap_or_default().parse()?;

    let inline = parts.next().filter(|p| !p.trim().is_empty());
    let possession = match possession.filter(|p| !p.trim().is_empty()).or(inline) {
        Some(p) => p.parse()?,
        None => Possession::Any,
    };

    Ok((action, possession))
}

pub(crate) fn normalize_access(access: &AccessInfo) -> Result<NormalizedAccess> {
    if access.role.is_empty() || !is_filled(&access.role) {
        return Err(ModelError::InvalidRole(format!("{:?}", access.role)));
    }
    if access.resource.is_empty() || !is_filled(&access.resource) {
        return Err(ModelError::InvalidResource(format!("{:?}", access.resource)));
    }

    // A deny always forces the attribute list to empty; a grant with no
    // attributes defaults to all.
    let attributes = if access.denied || matches!(&access.attributes, Some(a) if a.is_empty()) {
        Vec::new()
    } else {
        access
            .attributes
            .clone()
            .unwrap_or_else(|| vec!["*".to_string()])
    };

    let (action, possession) =
        normalize_action_possession(&access.action, access.possession.as_deref())?;

    Ok(NormalizedAccess {
        roles: access.role.clone(),
        resources: access.resource.clone(),
        action,
        possession,
        attributes,
    })
}

pub(crate) fn normalize_query(query: &QueryInfo) -> Result<NormalizedQuery> {
    if query.role.is_empty() || !is_filled(&query.role) {
        return Err(ModelError::InvalidRole(format!("{:?}", query.role)));
    }
    let resource = query.resource.trim();
    if resource.is_empty() {
        return Err(ModelError::InvalidResource(format!("\"{}\"", query.resource)));
    }

    let (action, possession) =
        normalize_action_possession(&query.action, query.possession.as_deref())?;

    Ok(NormalizedQuery {
        roles: query.role.clone(),
        resource: resource.to_string(),
        action,
        possession,
    })
}

/// Parse and validate one resource entry from the nested object form.
///
/// Keys must parse as `<action>[:<possession>]` and are stored fully
/// qualified; values must be an empty array or an array of non-empty
/// strings.
fn resource_entry_from_value(value: &Value) -> Result<ResourceEntry> {
    let obj = value
        .as_object()
        .ok_or_else(|| ModelError::InvalidGrants("Invalid resource definition.".to_string()))?;

    let mut entry = ResourceEntry::new();
    for (key, attrs_val) in obj {
        let mut parts = key.splitn(2, ':');
        let action: Action = parts.next().unwrap_or_default().parse()?;
        let possession = match parts.next().filter(|p| !p.trim().is_empty()) {
            Some(p) => p.parse()?,
            None => Possession::Any,
        };

        let attrs =
            string_array(attrs_val).ok_or_else(|| ModelError::InvalidAttributes(key.clone()))?;
        if !is_filled(&attrs) {
            return Err(ModelError::InvalidAttributes(key.clone()));
        }

        entry.insert(format!("{action}:{possession}"), attrs);
    }
    Ok(entry)
}

/// Extract an array of strings from a JSON value
fn string_array(value: &Value) -> Option<Vec<String>> {
    value.as_array().and_then(|items| {
        items
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect()
    })
}

impl GrantsModel {
    /// Inspect raw grants input and build a validated model.
    ///
    /// `raw` must be either a nested role object or an array of access
    /// records. In the object form, every `$extend` entry is applied through
    /// the role-hierarchy resolver in the same pass, so structural and
    /// hierarchy validation happen together. In the array form, each record
    /// is committed into a fresh empty model with full normalization.
    ///
    /// # Errors
    ///
    /// Fails with a [`ModelError`] on any structurally invalid entry,
    /// reserved name, unknown action/possession or illegal extension.
    pub fn from_value(raw: &Value) -> Result<GrantsModel> {
        match raw {
            Value::Object(map) => {
                let mut model = GrantsModel::new();
                let mut pending_extends: Vec<(String, Vec<String>)> = Vec::new();

                for (role_name, role_val) in map {
                    valid_name(role_name)?;
                    let role_obj = role_val.as_object().ok_or_else(|| {
                        ModelError::InvalidGrants(format!(
                            "Invalid role definition: \"{role_name}\"."
                        ))
                    })?;

                    let mut entry = RoleEntry::default();
                    for (key, val) in role_obj {
                        if key == "$extend" {
                            let extends = string_array(val)
                                .filter(|list| is_filled(list))
                                .ok_or_else(|| {
                                    ModelError::InvalidGrants(format!(
                                        "Invalid extend value for role \"{role_name}\"."
                                    ))
                                })?;
                            pending_extends.push((role_name.clone(), extends));
                        } else if !name_is_valid(key) {
                            return Err(ModelError::ReservedName(key.clone()));
                        } else {
                            entry
                                .resources
                                .insert(key.clone(), resource_entry_from_value(val)?);
                        }
                    }
                    model.roles.insert(role_name.clone(), entry);
                }

                // All roles exist at this point, so extension targets can be
                // validated against the complete graph.
                for (role, extends) in pending_extends {
                    model.extend_role(&[role], &extends)?;
                }

                Ok(model)
            }
            Value::Array(items) => {
                let mut model = GrantsModel::new();
                for item in items {
                    let access: AccessInfo = serde_json::from_value(item.clone())
                        .map_err(|e| ModelError::InvalidGrants(format!("Invalid access record: {e}")))?;
                    model.commit(&access)?;
                }
                Ok(model)
            }
            _ => Err(ModelError::InvalidGrants(
                "Expected an array or object.".to_string(),
            )),
        }
    }

    /// Commit an access record into the model.
    ///
    /// Auto-creates role and resource entries; writes the attribute list
    /// under the fully qualified `action:possession` key. Validation runs
    /// before any mutation, so a malformed record never partially commits.
    pub fn commit(&mut self, access: &AccessInfo) -> Result<()> {
        self.ensure_unlocked()?;
        let access = normalize_access(access)?;

        for role in &access.roles {
            valid_name(role)?;
        }
        for resource in &access.resources {
            valid_name(resource)?;
        }

        let key = format!("{}:{}", access.action, access.possession);
        for role in &access.roles {
            let entry = self.roles.entry(role.clone()).or_default();
            for resource in &access.resources {
                entry
                    .resources
                    .entry(resource.clone())
                    .or_default()
                    .insert(key.clone(), access.attributes.clone());
            }
            debug!(role = %role, key = %key, "access grant committed");
        }
        Ok(())
    }

    /// Create empty entries for roles that do not exist yet.
    ///
    /// Useful for declaring roles up front before any grant or extension
    /// references them.
    pub fn pre_create_roles(&mut self, roles: &[String]) -> Result<()> {
        self.ensure_unlocked()?;
        if roles.is_empty() {
            return Err(ModelError::InvalidRole(format!("{roles:?}")));
        }
        for role in roles {
            valid_name(role)?;
        }
        for role in roles {
            self.roles.entry(role.clone()).or_default();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_names() {
        assert_eq!(split_names("admin"), vec!["admin"]);
        assert_eq!(split_names("a, b ;c"), vec!["a", "b", "c"]);
        assert_eq!(split_names(""), vec![""]);
    }

    #[test]
    fn test_valid_name_rejects_reserved() {
        for reserved in RESERVED_KEYWORDS {
            assert_eq!(
                valid_name(reserved),
                Err(ModelError::ReservedName(reserved.to_string()))
            );
        }
        assert_eq!(valid_name("  "), Err(ModelError::InvalidName));
        assert!(valid_name("admin").is_ok());
    }

    #[test]
    fn test_normalize_action_possession() {
        assert_eq!(
            normalize_action_possession("read", None).unwrap(),
            (Action::Read, Possession::Any)
        );
        assert_eq!(
            normalize_action_possession("read:own", None).unwrap(),
            (Action::Read, Possession::Own)
        );
        // explicit possession wins over the inline one
        assert_eq!(
            normalize_action_possession("read:own", Some("any")).unwrap(),
            (Action::Read, Possession::Any)
        );
        assert_eq!(
            normalize_action_possession(" UPDATE : OWN ", None).unwrap(),
            (Action::Update, Possession::Own)
        );
        assert!(normalize_action_possession("fly", None).is_err());
        assert!(normalize_action_possession("read:some", None).is_err());
    }

    #[test]
    fn test_deny_forces_empty_attributes() {
        let access = AccessInfo::new("user", "video", "read")
            .with_attributes(vec!["title".to_string()])
            .denied();
        let normalized = normalize_access(&access).unwrap();
        assert!(normalized.attributes.is_empty());
    }

    #[test]
    fn test_omitted_attributes_default_to_all() {
        let access = AccessInfo::new("user", "video", "read");
        let normalized = normalize_access(&access).unwrap();
        assert_eq!(normalized.attributes, vec!["*"]);
    }

    #[test]
    fn test_from_value_object_form() {
        let model = GrantsModel::from_value(&json!({
            "viewer": { "account": { "read:own": ["*"] } },
            "admin": { "account": { "create": ["*"] } }
        }))
        .unwrap();

        assert_eq!(model.roles(), vec!["admin", "viewer"]);
        // possession defaults to "any" when the key has none
        let entry = model.role("admin").unwrap().resource("account").unwrap();
        assert_eq!(entry["create:any"], vec!["*"]);
    }

    #[test]
    fn test_from_value_list_form() {
        let model = GrantsModel::from_value(&json!([
            { "role": "user", "resource": "video", "action": "create:own" },
            { "role": "user", "resource": "video", "action": "delete:own", "denied": true }
        ]))
        .unwrap();

        let entry = model.role("user").unwrap().resource("video").unwrap();
        assert_eq!(entry["create:own"], vec!["*"]);
        assert!(entry["delete:own"].is_empty());
    }

    #[test]
    fn test_from_value_rejects_primitives() {
        assert!(matches!(
            GrantsModel::from_value(&json!("grants")),
            Err(ModelError::InvalidGrants(_))
        ));
        assert!(matches!(
            GrantsModel::from_value(&json!(null)),
            Err(ModelError::InvalidGrants(_))
        ));
    }

    #[test]
    fn test_from_value_rejects_reserved_role() {
        let result = GrantsModel::from_value(&json!({
            "$": { "account": { "read": ["*"] } }
        }));
        assert_eq!(result, Err(ModelError::ReservedName("$".to_string())));
    }

    #[test]
    fn test_from_value_rejects_bad_action() {
        let result = GrantsModel::from_value(&json!({
            "user": { "account": { "fly": ["*"] } }
        }));
        assert_eq!(result, Err(ModelError::InvalidAction("fly".to_string())));
    }

    #[test]
    fn test_from_value_rejects_bad_attributes() {
        let result = GrantsModel::from_value(&json!({
            "user": { "account": { "read": [""] } }
        }));
        assert_eq!(
            result,
            Err(ModelError::InvalidAttributes("read".to_string()))
        );

        let result = GrantsModel::from_value(&json!({
            "user": { "account": { "read": "all" } }
        }));
        assert_eq!(
            result,
            Err(ModelError::InvalidAttributes("read".to_string()))
        );
    }

    #[test]
    fn test_from_value_applies_extend() {
        let model = GrantsModel::from_value(&json!({
            "viewer": { "account": { "read:own": ["*"] } },
            "user": { "$extend": ["viewer"] }
        }))
        .unwrap();

        assert_eq!(model.role("user").unwrap().extends(), ["viewer"]);
    }

    #[test]
    fn test_from_value_rejects_bad_extend_value() {
        let result = GrantsModel::from_value(&json!({
            "user": { "$extend": "viewer" }
        }));
        assert!(matches!(result, Err(ModelError::InvalidGrants(_))));
    }

    #[test]
    fn test_commit_comma_separated_shorthand() {
        let mut model = GrantsModel::new();
        model
            .commit(&AccessInfo::new("editor, reviewer", "draft; article", "update:own"))
            .unwrap();

        for role in ["editor", "reviewer"] {
            for resource in ["draft", "article"] {
                assert!(model.has_resource(role, resource), "{role}/{resource}");
            }
        }
    }

    #[test]
    fn test_commit_rejects_reserved_resource() {
        let mut model = GrantsModel::new();
        let result = model.commit(&AccessInfo::new("user", "$extend", "read"));
        assert_eq!(result, Err(ModelError::ReservedName("$extend".to_string())));
        // fail-fast: nothing was committed
        assert!(model.is_empty());
    }

    #[test]
    fn test_pre_create_roles() {
        let mut model = GrantsModel::new();
        model
            .pre_create_roles(&["admin".to_string(), "user".to_string()])
            .unwrap();
        assert!(model.has_role("admin"));
        assert!(model.has_role("user"));
        assert!(model.pre_create_roles(&[]).is_err());
    }
}
