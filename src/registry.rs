//! Process-wide permission registry
//!
//! Built once at startup from the permission groups compiled into the running
//! application mode, then shared read-only (typically as
//! `Arc<PermissionRegistry>`) with everything that checks permissions.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::declarations::BUILTIN_GROUPS;
use super::error::RegistryError;
use super::permission::{Permission, PermissionGroup};

/// Which half of the application is running. Some permission groups only
/// exist in one of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppMode {
    #[default]
    Admin,
    Site,
}

#[derive(Debug, Default)]
pub struct PermissionRegistryBuilder {
    groups: BTreeMap<String, PermissionGroup>,
}

impl PermissionRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group of permission names under `key`.
    ///
    /// Registering the same key twice is a configuration error.
    pub fn register_group<S: AsRef<str>>(
        &mut self,
        key: &str,
        members: &[S],
    ) -> Result<&mut Self, RegistryError> {
        self.register(PermissionGroup::new(key, members)?)
    }

    pub fn register_group_with_titles(
        &mut self,
        key: &str,
        members: &[(&str, &str)],
    ) -> Result<&mut Self, RegistryError> {
        self.register(PermissionGroup::with_titles(key, members)?)
    }

    pub fn register(&mut self, group: PermissionGroup) -> Result<&mut Self, RegistryError> {
        if self.groups.contains_key(group.key()) {
            return Err(RegistryError::DuplicateGroup(group.key().to_string()));
        }
        tracing::debug!(key = group.key(), members = group.members().len(), "registered permission group");
        self.groups.insert(group.key().to_string(), group);
        Ok(self)
    }

    pub fn build(self) -> PermissionRegistry {
        PermissionRegistry {
            groups: self.groups,
        }
    }
}

#[derive(Debug, Default)]
pub struct PermissionRegistry {
    groups: BTreeMap<String, PermissionGroup>,
}

impl PermissionRegistry {
    pub fn builder() -> PermissionRegistryBuilder {
        PermissionRegistryBuilder::new()
    }

    /// Registry holding every built-in group compiled into `mode`.
    pub fn for_mode(mode: AppMode) -> Result<Self, RegistryError> {
        let mut builder = Self::builder();
        for declaration in BUILTIN_GROUPS.iter().filter(|d| d.modes.contains(&mode)) {
            builder.register_group_with_titles(declaration.key, declaration.members)?;
        }
        Ok(builder.build())
    }

    pub fn group(&self, key: &str) -> Option<&PermissionGroup> {
        self.groups.get(key)
    }

    /// Registered groups, ordered by key.
    pub fn groups(&self) -> impl Iterator<Item = &PermissionGroup> {
        self.groups.values()
    }

    /// Resolve a `<group>.<name>` identifier to its registered permission.
    ///
    /// Misses are not errors: an unknown group usually belongs to a part of
    /// the application not active in this process, an unknown name within a
    /// known group is stale persisted data and is logged.
    pub fn resolve(&self, permission_id: &str) -> Option<Permission> {
        let Some((key, name)) = permission_id.split_once('.') else {
            tracing::warn!(permission_id, "ignoring malformed permission id");
            return None;
        };

        let Some(group) = self.groups.get(key) else {
            tracing::debug!(permission_id, "no permission group registered for id");
            return None;
        };

        let permission = group.member(name);
        if permission.is_none() {
            tracing::warn!(
                permission_id,
                group = key,
                name,
                "ignoring unknown permission name configured in database"
            );
        }
        permission
    }

    /// Resolve each identifier independently, dropping the ones that do not
    /// resolve.
    pub fn resolve_many<I, S>(&self, permission_ids: I) -> BTreeSet<Permission>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        permission_ids
            .into_iter()
            .filter_map(|id| self.resolve(id.as_ref()))
            .collect()
    }
}
