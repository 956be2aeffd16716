//! The canonical in-memory grants model and its lock transition

use crate::error::{ModelError, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

/// Resource entry: `"action:possession"` key to allowed-attribute list.
///
/// Keys are always fully qualified after normalization; an empty attribute
/// list means the permission is effectively denied even though the key
/// exists.
pub type ResourceEntry = HashMap<String, Vec<String>>;

/// Per-role grants: resources plus the ordered list of extended roles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleEntry {
    pub(crate) resources: HashMap<String, ResourceEntry>,
    pub(crate) extends: Vec<String>,
}

impl RoleEntry {
    /// Roles this role inherits from, in declaration order
    pub fn extends(&self) -> &[String] {
        &self.extends
    }

    /// Look up a resource entry by name
    pub fn resource(&self, name: &str) -> Option<&ResourceEntry> {
        self.resources.get(name)
    }

    /// Resource names granted on this role, sorted
    pub fn resource_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.resources.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Validated, canonical grants model: role name to [`RoleEntry`].
///
/// Created empty or from raw input via [`GrantsModel::from_value`], mutated
/// through the commit/extend operations until [`GrantsModel::lock`] seals it.
/// Locking is terminal for the instance; a fresh instance is required to get
/// a mutable model again.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GrantsModel {
    pub(crate) roles: HashMap<String, RoleEntry>,
    locked: bool,
}

impl GrantsModel {
    /// Create an empty, unlocked grants model
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the model holds no roles
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Whether the model has been locked
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Whether the given role exists
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains_key(role)
    }

    /// Whether the given role has any grant on the given resource
    pub fn has_resource(&self, role: &str, resource: &str) -> bool {
        self.roles
            .get(role)
            .is_some_and(|entry| entry.resources.contains_key(resource))
    }

    /// Look up a role entry by name
    pub fn role(&self, name: &str) -> Option<&RoleEntry> {
        self.roles.get(name)
    }

    /// All role names, sorted
    pub fn roles(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.roles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// All resources granted to at least one role, unique and sorted
    pub fn resources(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .roles
            .values()
            .flat_map(|entry| entry.resources.keys().map(String::as_str))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Export the model as a JSON-shaped value.
    ///
    /// Role entries serialize as nested objects; a non-empty extension list
    /// appears under the reserved `$extend` key. The result round-trips
    /// through [`GrantsModel::from_value`].
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        for name in self.roles() {
            let entry = &self.roles[name];
            let mut role_obj = Map::new();
            if !entry.extends.is_empty() {
                role_obj.insert(
                    "$extend".to_string(),
                    Value::Array(
                        entry
                            .extends
                            .iter()
                            .map(|r| Value::String(r.clone()))
                            .collect(),
                    ),
                );
            }
            for res in entry.resource_names() {
                let res_entry = &entry.resources[res];
                let mut keys: Vec<&String> = res_entry.keys().collect();
                keys.sort_unstable();
                let mut res_obj = Map::new();
                for key in keys {
                    res_obj.insert(
                        key.clone(),
                        Value::Array(
                            res_entry[key]
                                .iter()
                                .map(|a| Value::String(a.clone()))
                                .collect(),
                        ),
                    );
                }
                role_obj.insert(res.to_string(), Value::Object(res_obj));
            }
            out.insert(name.to_string(), Value::Object(role_obj));
        }
        Value::Object(out)
    }

    /// Lock the model, making it permanently read-only.
    ///
    /// Fails on an empty model. Idempotent: locking a locked model is a
    /// no-op. Reads remain valid after the transition.
    pub fn lock(&mut self) -> Result<()> {
        if self.roles.is_empty() {
            return Err(ModelError::EmptyModel);
        }
        if !self.locked {
            debug!(roles = self.roles.len(), "grants model locked");
            self.locked = true;
        }
        Ok(())
    }

    /// Fails with the lock-violation error once the model is sealed.
    /// Every mutating operation routes through this check first.
    pub(crate) fn ensure_unlocked(&self) -> Result<()> {
        if self.locked {
            return Err(ModelError::Locked);
        }
        Ok(())
    }
}
