//! Permission queries over the grants model

use crate::error::Result;
use crate::glob::AttributeAlgebra;
use crate::grants::GrantsModel;
use crate::types::{Action, Possession, QueryInfo};
use crate::validate::{normalize_query, NormalizedQuery};
use serde_json::Value;
use tracing::trace;

/// Result of a permission query.
///
/// Carries the normalized query fields and the union of attribute patterns
/// granted across the queried roles and everything they extend. A query
/// whose role/resource pair holds no grant is not an error; it simply
/// yields an ungranted permission with an empty attribute list.
#[derive(Debug, Clone, PartialEq)]
pub struct Permission {
    roles: Vec<String>,
    resource: String,
    action: Action,
    possession: Possession,
    attributes: Vec<String>,
}

impl Permission {
    /// Whether the query is granted: true iff any attributes were collected
    pub fn granted(&self) -> bool {
        !self.attributes.is_empty()
    }

    /// Attribute patterns the query may see or write
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Roles the query was made for (not the flattened set)
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Queried resource name
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Normalized action
    pub fn action(&self) -> Action {
        self.action
    }

    /// Normalized possession
    pub fn possession(&self) -> Possession {
        self.possession
    }

    /// Filter a data value down to the granted attributes
    pub fn filter<A: AttributeAlgebra>(&self, algebra: &A, data: &Value) -> Value {
        algebra.filter(data, &self.attributes)
    }
}

impl GrantsModel {
    /// Attribute patterns granted to the queried role(s) for a resource,
    /// action and possession.
    ///
    /// Each queried role is flattened through the hierarchy resolver; for
    /// every role in the flattened set the exact `action:possession` entry
    /// is read, falling back to `action:any` (an "any" grant always also
    /// satisfies an "own" query). The collected lists are folded through the
    /// algebra's union. Roles without a matching grant contribute nothing;
    /// if no role matches at all the result is empty.
    pub fn permitted_attributes<A: AttributeAlgebra>(
        &self,
        query: &QueryInfo,
        algebra: &A,
    ) -> Result<Vec<String>> {
        let normalized = normalize_query(query)?;
        self.union_attrs(&normalized, algebra)
    }

    /// Run a permission query, returning the full [`Permission`] result
    pub fn permission<A: AttributeAlgebra>(
        &self,
        query: &QueryInfo,
        algebra: &A,
    ) -> Result<Permission> {
        let normalized = normalize_query(query)?;
        let attributes = self.union_attrs(&normalized, algebra)?;
        Ok(Permission {
            roles: normalized.roles,
            resource: normalized.resource,
            action: normalized.action,
            possession: normalized.possession,
            attributes,
        })
    }

    fn union_attrs<A: AttributeAlgebra>(
        &self,
        query: &NormalizedQuery,
        algebra: &A,
    ) -> Result<Vec<String>> {
        let flat = self.flat_roles(&query.roles)?;
        let exact = format!("{}:{}", query.action, query.possession);
        let fallback = format!("{}:{}", query.action, Possession::Any);

        let mut lists: Vec<Vec<String>> = Vec::new();
        for role in &flat {
            let Some(entry) = self.roles.get(role) else {
                continue;
            };
            if let Some(resource) = entry.resources.get(&query.resource) {
                let attrs = resource.get(&exact).or_else(|| resource.get(&fallback));
                lists.push(attrs.cloned().unwrap_or_default());
            }
        }

        let mut iter = lists.into_iter();
        let mut attrs = iter.next().unwrap_or_default();
        for list in iter {
            attrs = algebra.union(&attrs, &list);
        }

        trace!(
            resource = %query.resource,
            key = %exact,
            granted = !attrs.is_empty(),
            "permission query resolved"
        );
        Ok(attrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::glob::FlatUnion;
    use crate::types::AccessInfo;

    fn vs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_simple_grant_query() {
        let mut model = GrantsModel::new();
        model
            .commit(
                &AccessInfo::new("user", "video", "create:own")
                    .with_attributes(vs(&["title", "id"])),
            )
            .unwrap();

        let permission = model
            .permission(
                &QueryInfo::new("user", "video", "create").with_possession("own"),
                &FlatUnion,
            )
            .unwrap();

        assert!(permission.granted());
        assert_eq!(permission.attributes(), ["title", "id"]);
        assert_eq!(permission.action(), Action::Create);
        assert_eq!(permission.possession(), Possession::Own);
    }

    #[test]
    fn test_any_grant_satisfies_own_query() {
        let mut model = GrantsModel::new();
        model
            .commit(&AccessInfo::new("user", "video", "read:any").with_attributes(vs(&["title"])))
            .unwrap();

        let attrs = model
            .permitted_attributes(
                &QueryInfo::new("user", "video", "read:own"),
                &FlatUnion,
            )
            .unwrap();
        assert_eq!(attrs, vs(&["title"]));
    }

    #[test]
    fn test_own_grant_does_not_satisfy_any_query() {
        let mut model = GrantsModel::new();
        model
            .commit(&AccessInfo::new("user", "video", "read:own"))
            .unwrap();

        let permission = model
            .permission(&QueryInfo::new("user", "video", "read:any"), &FlatUnion)
            .unwrap();
        assert!(!permission.granted());
    }

    #[test]
    fn test_unmatched_resource_is_not_an_error() {
        let mut model = GrantsModel::new();
        model
            .commit(&AccessInfo::new("user", "video", "read"))
            .unwrap();

        let permission = model
            .permission(&QueryInfo::new("user", "photo", "read"), &FlatUnion)
            .unwrap();
        assert!(!permission.granted());
        assert!(permission.attributes().is_empty());
    }

    #[test]
    fn test_unknown_role_is_an_error() {
        let model = GrantsModel::new();
        let result = model.permission(&QueryInfo::new("ghost", "video", "read"), &FlatUnion);
        assert_eq!(result, Err(ModelError::RoleNotFound("ghost".to_string())));
    }

    #[test]
    fn test_denied_record_yields_ungranted() {
        let mut model = GrantsModel::new();
        model
            .commit(
                &AccessInfo::new("user", "video", "delete:own")
                    .with_attributes(vs(&["*"]))
                    .denied(),
            )
            .unwrap();

        let permission = model
            .permission(&QueryInfo::new("user", "video", "delete:own"), &FlatUnion)
            .unwrap();
        assert!(!permission.granted());
    }

    #[test]
    fn test_multi_role_union() {
        let mut model = GrantsModel::new();
        model
            .commit(&AccessInfo::new("r1", "doc", "read").with_attributes(vs(&["a", "b"])))
            .unwrap();
        model
            .commit(&AccessInfo::new("r2", "doc", "read").with_attributes(vs(&["b", "c"])))
            .unwrap();

        let attrs = model
            .permitted_attributes(&QueryInfo::roles(&["r1", "r2"], "doc", "read"), &FlatUnion)
            .unwrap();
        assert_eq!(attrs, vs(&["a", "b", "c"]));
    }

    #[test]
    fn test_inherited_grant_through_extension() {
        let mut model = GrantsModel::new();
        model
            .commit(&AccessInfo::new("viewer", "account", "read:own"))
            .unwrap();
        model
            .extend_role(&["user".to_string()], &["viewer".to_string()])
            .unwrap();

        let permission = model
            .permission(&QueryInfo::new("user", "account", "read:own"), &FlatUnion)
            .unwrap();
        assert!(permission.granted());
        assert_eq!(permission.attributes(), ["*"]);
    }

    #[test]
    fn test_filter_through_permission() {
        let mut model = GrantsModel::new();
        model
            .commit(&AccessInfo::new("user", "video", "read").with_attributes(vs(&["title"])))
            .unwrap();

        let permission = model
            .permission(&QueryInfo::new("user", "video", "read"), &FlatUnion)
            .unwrap();
        let data = serde_json::json!({ "title": "intro", "secret": true });
        assert_eq!(
            permission.filter(&FlatUnion, &data),
            serde_json::json!({ "title": "intro" })
        );
    }
}
