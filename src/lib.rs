//! # access-grants
//!
//! Embeddable authorization engine: a declarative model of which roles may
//! perform which CRUD actions, scoped to "own" or "any" possession, on
//! which resources, and which data attributes each grant exposes.
//!
//! ## Features
//!
//! - **Validated grants model** built from a nested role object or a flat
//!   list of access records ([`GrantsModel::from_value`])
//! - **Role inheritance** through declared extensions, kept acyclic and
//!   free of cross-inheritance at declaration time
//! - **Permission queries** that flatten the role hierarchy, fall back
//!   from "own" to "any" possession and union attributes across roles
//! - **Lock transition** sealing the model into a read-only state
//! - **Attribute-glob seam** ([`AttributeAlgebra`]) for pattern union and
//!   data filtering, with a plain-list default ([`FlatUnion`])
//!
//! ## Example
//!
//! ```rust
//! use access_grants::{AccessInfo, FlatUnion, GrantsModel, QueryInfo};
//!
//! fn main() -> access_grants::Result<()> {
//!     let mut model = GrantsModel::new();
//!     model.commit(&AccessInfo::new("viewer", "account", "read:own"))?;
//!     model.extend_role(&["admin".to_string()], &["viewer".to_string()])?;
//!     model.lock()?;
//!
//!     let permission =
//!         model.permission(&QueryInfo::new("admin", "account", "read:own"), &FlatUnion)?;
//!     assert!(permission.granted());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod glob;
pub mod grants;
pub mod hierarchy;
pub mod query;
pub mod types;
pub mod validate;

// Re-export commonly used types
pub use error::{ModelError, Result};
pub use glob::{AttributeAlgebra, FlatUnion};
pub use grants::{GrantsModel, ResourceEntry, RoleEntry};
pub use query::Permission;
pub use types::{AccessInfo, Action, Possession, QueryInfo};
pub use validate::{normalize_action_possession, valid_name, RESERVED_KEYWORDS};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
