//! Role hierarchy resolution and extension
//!
//! Roles may extend other roles, forming a directed graph that must stay
//! acyclic and free of cross-inheritance. The resolver flattens a role's
//! transitive extension chain into an ordered, duplicate-free list; the
//! extend operation validates every new edge against the current graph, so
//! illegal hierarchies are rejected at declaration time, never at query
//! time.

use crate::error::{ModelError, Result};
use crate::grants::GrantsModel;
use crate::validate::{is_filled, valid_name};
use std::collections::HashSet;
use tracing::debug;

/// Append `item` unless it is already present, preserving insertion order
pub(crate) fn push_uniq(arr: &mut Vec<String>, item: String) {
    if !arr.contains(&item) {
        arr.push(item);
    }
}

impl GrantsModel {
    /// Flat, ordered hierarchy of the given role: the role itself first,
    /// then the depth-first, duplicate-free closure of every transitively
    /// extended role. First occurrence wins position.
    ///
    /// The walk is iterative with an explicit stack and visited set, so the
    /// depth of the graph never translates into call-stack depth.
    ///
    /// # Errors
    ///
    /// - [`ModelError::RoleNotFound`] if the role or any extended role is
    ///   absent from the model
    /// - [`ModelError::SelfExtension`] if an extension list names its own
    ///   role
    /// - [`ModelError::CrossInheritance`] if the walk reaches back to the
    ///   role the resolution started from
    pub fn hierarchy_of(&self, role: &str) -> Result<Vec<String>> {
        if !self.roles.contains_key(role) {
            return Err(ModelError::RoleNotFound(role.to_string()));
        }

        let origin = role;
        let mut order: Vec<String> = Vec::new();
        let mut walked: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = vec![role];

        while let Some(current) = stack.pop() {
            if !walked.insert(current) {
                continue;
            }
            order.push(current.to_string());

            let entry = self
                .roles
                .get(current)
                .ok_or_else(|| ModelError::RoleNotFound(current.to_string()))?;

            for ext in &entry.extends {
                if !self.roles.contains_key(ext) {
                    return Err(ModelError::RoleNotFound(ext.clone()));
                }
                if ext == current {
                    return Err(ModelError::SelfExtension(current.to_string()));
                }
                if ext == origin {
                    return Err(ModelError::CrossInheritance {
                        role: current.to_string(),
                        other: origin.to_string(),
                    });
                }
            }
            // reversed so the stack pops extensions in declaration order
            for ext in entry.extends.iter().rev() {
                stack.push(ext);
            }
        }

        Ok(order)
    }

    /// Union of the flattened hierarchies of several roles, order-preserving
    pub fn flat_roles(&self, roles: &[String]) -> Result<Vec<String>> {
        if roles.is_empty() || !is_filled(roles) {
            return Err(ModelError::InvalidRole(format!("{roles:?}")));
        }
        let mut flat: Vec<String> = Vec::new();
        for role in roles {
            push_uniq(&mut flat, role.clone());
        }
        for role in roles {
            for inherited in self.hierarchy_of(role)? {
                push_uniq(&mut flat, inherited);
            }
        }
        Ok(flat)
    }

    /// Roles from the given list that are absent from the model
    pub fn non_existent_roles(&self, roles: &[String]) -> Vec<String> {
        roles
            .iter()
            .filter(|role| !self.roles.contains_key(*role))
            .cloned()
            .collect()
    }

    /// First candidate whose own hierarchy already contains `role`.
    ///
    /// A `Some` result means adding `role extends candidate` would create a
    /// cycle. A candidate equal to `role` itself is skipped; self-extension
    /// is reported by its own check.
    pub fn cross_extending_role(
        &self,
        role: &str,
        candidates: &[String],
    ) -> Result<Option<String>> {
        for candidate in candidates {
            if candidate == role {
                continue;
            }
            if self.hierarchy_of(candidate)?.iter().any(|r| r == role) {
                return Ok(Some(candidate.clone()));
            }
        }
        Ok(None)
    }

    /// Extend each target role with the privileges of the extender roles.
    ///
    /// Extenders must already exist; target roles are auto-created. Every
    /// new edge is validated against the current graph before anything is
    /// appended, so a failed call leaves the model unchanged. Appends are
    /// unique; declaring an extension twice is harmless. An empty extender
    /// list is a no-op.
    ///
    /// # Errors
    ///
    /// - [`ModelError::Locked`] after the model has been locked
    /// - [`ModelError::InvalidRole`] for empty or blank role lists
    /// - [`ModelError::RoleNotFound`] for non-existent extenders
    /// - [`ModelError::SelfExtension`] if a target appears in the extender
    ///   list
    /// - [`ModelError::CrossInheritance`] if an extender already
    ///   (transitively) extends the target
    pub fn extend_role(&mut self, roles: &[String], extenders: &[String]) -> Result<()> {
        self.ensure_unlocked()?;
        if roles.is_empty() || !is_filled(roles) {
            return Err(ModelError::InvalidRole(format!("{roles:?}")));
        }
        if extenders.is_empty() {
            return Ok(());
        }
        if !is_filled(extenders) {
            return Err(ModelError::InvalidRole(format!("{extenders:?}")));
        }

        let missing = self.non_existent_roles(extenders);
        if !missing.is_empty() {
            return Err(ModelError::RoleNotFound(missing.join(", ")));
        }

        for role in roles {
            valid_name(role)?;
            if extenders.contains(role) {
                return Err(ModelError::SelfExtension(role.clone()));
            }
            if let Some(cross) = self.cross_extending_role(role, extenders)? {
                return Err(ModelError::CrossInheritance {
                    role: cross,
                    other: role.clone(),
                });
            }
        }

        for role in roles {
            let entry = self.roles.entry(role.clone()).or_default();
            for ext in extenders {
                push_uniq(&mut entry.extends, ext.clone());
            }
            debug!(role = %role, extends = ?entry.extends, "role extension committed");
        }
        Ok(())
    }
}
