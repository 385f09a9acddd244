//! Roles, their permissions and their holders
//!
//! Permission ids are stored as plain `<group>.<name>` strings. Whether a
//! stored id still means anything is decided at check time by the
//! [`PermissionRegistry`] of the running process, see [`Authorizer`].
use sled::transaction::ConflictableTransactionError;
use sled::{Batch, Db, Transactional, Tree};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::error::AuthorizationError;
use super::keys;
use super::permission::Permission;
use super::registry::PermissionRegistry;
use super::timestamp::Timestamp;

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct Role {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct PermissionRecord {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum UserEventType {
    #[n(0)]
    RoleAssigned,
    #[n(1)]
    RoleDeassigned,
}

impl UserEventType {
    pub fn name(&self) -> &'static str {
        match self {
            UserEventType::RoleAssigned => "role-assigned",
            UserEventType::RoleDeassigned => "role-deassigned",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct UserEvent {
    #[n(0)]
    pub occurred_at: Timestamp,
    #[n(1)]
    pub event_type: UserEventType,
    #[n(2)]
    pub user_id: String,
    #[n(3)]
    pub role_id: String,
    #[n(4)]
    pub initiator_id: Option<String>,
}

// assignment rows carry no value
const MARKER: &[u8] = &[];

pub struct AuthorizationService {
    roles: Tree,
    permissions: Tree,
    role_permissions: Tree, // role \0 permission
    user_roles: Tree,       // user \0 role
    role_users: Tree,       // role \0 user, mirrors user_roles
    user_events: Tree,      // user \0 uuid7
}

impl AuthorizationService {
    pub fn new(instance: Arc<Db>) -> Result<Self, AuthorizationError> {
        Ok(Self {
            roles: instance.open_tree("roles")?,
            permissions: instance.open_tree("permissions")?,
            role_permissions: instance.open_tree("role_permissions")?,
            user_roles: instance.open_tree("user_roles")?,
            role_users: instance.open_tree("role_users")?,
            user_events: instance.open_tree("user_events")?,
        })
    }

    pub fn create_permission(
        &self,
        permission_id: &str,
        title: &str,
    ) -> Result<PermissionRecord, AuthorizationError> {
        keys::check_component(permission_id)?;
        let record = PermissionRecord {
            id: permission_id.to_string(),
            title: title.to_string(),
        };
        let swapped = self.permissions.compare_and_swap(
            permission_id.as_bytes(),
            None as Option<&[u8]>,
            Some(encode(&record)?),
        )?;
        if swapped.is_err() {
            return Err(AuthorizationError::DuplicatePermission(
                permission_id.to_string(),
            ));
        }
        tracing::info!(permission_id, "created permission");
        Ok(record)
    }

    pub fn create_role(&self, role_id: &str, title: &str) -> Result<Role, AuthorizationError> {
        keys::check_component(role_id)?;
        let role = Role {
            id: role_id.to_string(),
            title: title.to_string(),
        };
        let swapped = self.roles.compare_and_swap(
            role_id.as_bytes(),
            None as Option<&[u8]>,
            Some(encode(&role)?),
        )?;
        if swapped.is_err() {
            return Err(AuthorizationError::DuplicateRole(role_id.to_string()));
        }
        tracing::info!(role_id, "created role");
        Ok(role)
    }

    /// Delete the role together with its permission and user assignments.
    ///
    /// The role row goes first. Assignments check for the role inside their
    /// own transaction, so none can be added once it is gone and the scan
    /// below sees every assignment that will ever exist for it.
    pub fn delete_role(&self, role_id: &str) -> Result<(), AuthorizationError> {
        keys::check_component(role_id)?;
        self.roles.transaction(|roles| {
            if roles.remove(role_id.as_bytes())?.is_none() {
                return Err(ConflictableTransactionError::Abort(
                    AuthorizationError::UnknownRole(role_id.to_string()),
                ));
            }
            Ok(())
        })?;

        let mut role_permissions = Batch::default();
        for key in self.role_permissions.scan_prefix(keys::family_prefix(role_id)?).keys() {
            role_permissions.remove(key?);
        }

        let mut user_roles = Batch::default();
        let mut role_users = Batch::default();
        for key in self.role_users.scan_prefix(keys::family_prefix(role_id)?).keys() {
            let key = key?;
            if let Some(user_id) = keys::tail_str(&key) {
                user_roles.remove(keys::composite_key(user_id, role_id.as_bytes())?);
            }
            role_users.remove(key);
        }

        (&self.role_permissions, &self.user_roles, &self.role_users).transaction(
            |(role_permissions_tx, user_roles_tx, role_users_tx)| {
                role_permissions_tx.apply_batch(&role_permissions)?;
                user_roles_tx.apply_batch(&user_roles)?;
                role_users_tx.apply_batch(&role_users)?;
                Ok::<_, ConflictableTransactionError<AuthorizationError>>(())
            },
        )?;

        tracing::info!(role_id, "deleted role");
        Ok(())
    }

    pub fn find_role(&self, role_id: &str) -> Result<Option<Role>, AuthorizationError> {
        self.roles
            .get(role_id.as_bytes())?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    pub fn find_permission(
        &self,
        permission_id: &str,
    ) -> Result<Option<PermissionRecord>, AuthorizationError> {
        self.permissions
            .get(permission_id.as_bytes())?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    pub fn get_all_role_ids(&self) -> Result<BTreeSet<String>, AuthorizationError> {
        let mut role_ids = BTreeSet::new();
        for key in self.roles.iter().keys() {
            let key = key?;
            let role_id = std::str::from_utf8(&key)
                .map_err(|e| AuthorizationError::Encoding(e.to_string()))?;
            role_ids.insert(role_id.to_string());
        }
        Ok(role_ids)
    }

    /// All roles, ordered by id.
    pub fn get_all_roles_with_titles(&self) -> Result<Vec<Role>, AuthorizationError> {
        self.roles
            .iter()
            .values()
            .map(|bytes| decode(&bytes?))
            .collect()
    }

    /// All permissions, ordered by id.
    pub fn get_all_permissions_with_titles(
        &self,
    ) -> Result<Vec<PermissionRecord>, AuthorizationError> {
        self.permissions
            .iter()
            .values()
            .map(|bytes| decode(&bytes?))
            .collect()
    }

    /// Permission records assigned to the role, ordered by id. Assignments
    /// whose permission row is gone are skipped.
    pub fn get_permissions_with_titles_for_role(
        &self,
        role_id: &str,
    ) -> Result<Vec<PermissionRecord>, AuthorizationError> {
        let mut records = Vec::new();
        for permission_id in self.get_permission_ids_for_role(role_id)? {
            if let Some(record) = self.find_permission(&permission_id)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Every role with the permissions assigned to it, roles ordered by id.
    /// Roles without permissions are included with an empty list.
    pub fn get_permissions_by_roles_with_titles(
        &self,
    ) -> Result<Vec<(Role, Vec<PermissionRecord>)>, AuthorizationError> {
        self.get_all_roles_with_titles()?
            .into_iter()
            .map(|role| {
                let records = self.get_permissions_with_titles_for_role(&role.id)?;
                Ok((role, records))
            })
            .collect()
    }

    /// Like [`Self::get_permissions_by_roles_with_titles`], restricted to the
    /// roles the user holds.
    pub fn get_permissions_by_roles_for_user_with_titles(
        &self,
        user_id: &str,
    ) -> Result<Vec<(Role, Vec<PermissionRecord>)>, AuthorizationError> {
        let mut by_role = Vec::new();
        for role_id in self.find_role_ids_for_user(user_id)? {
            let Some(role) = self.find_role(&role_id)? else {
                continue;
            };
            let records = self.get_permissions_with_titles_for_role(&role_id)?;
            by_role.push((role, records));
        }
        Ok(by_role)
    }

    pub fn assign_permission_to_role(
        &self,
        permission_id: &str,
        role_id: &str,
    ) -> Result<(), AuthorizationError> {
        let key = keys::composite_key(role_id, permission_id.as_bytes())?;
        (&self.roles, &self.permissions, &self.role_permissions).transaction(
            |(roles, permissions, role_permissions)| {
                if permissions.get(permission_id.as_bytes())?.is_none() {
                    return Err(ConflictableTransactionError::Abort(
                        AuthorizationError::UnknownPermission(permission_id.to_string()),
                    ));
                }
                if roles.get(role_id.as_bytes())?.is_none() {
                    return Err(ConflictableTransactionError::Abort(
                        AuthorizationError::UnknownRole(role_id.to_string()),
                    ));
                }
                role_permissions.insert(key.as_slice(), MARKER)?;
                Ok(())
            },
        )?;
        tracing::info!(permission_id, role_id, "assigned permission to role");
        Ok(())
    }

    pub fn deassign_permission_from_role(
        &self,
        permission_id: &str,
        role_id: &str,
    ) -> Result<(), AuthorizationError> {
        let key = keys::composite_key(role_id, permission_id.as_bytes())?;
        if self.role_permissions.remove(key)?.is_none() {
            return Err(AuthorizationError::NotAssigned {
                assignee: permission_id.to_string(),
                target: role_id.to_string(),
            });
        }
        tracing::info!(permission_id, role_id, "deassigned permission from role");
        Ok(())
    }

    pub fn get_permission_ids_for_role(
        &self,
        role_id: &str,
    ) -> Result<BTreeSet<String>, AuthorizationError> {
        family_tails(&self.role_permissions, role_id)
    }

    /// Assign the role to the user. Assigning it again is a no-op.
    pub fn assign_role_to_user(
        &self,
        role_id: &str,
        user_id: &str,
        initiator_id: Option<&str>,
    ) -> Result<(), AuthorizationError> {
        let key = keys::composite_key(user_id, role_id.as_bytes())?;
        let reverse_key = keys::composite_key(role_id, user_id.as_bytes())?;
        let event = UserEvent {
            occurred_at: Timestamp::now(),
            event_type: UserEventType::RoleAssigned,
            user_id: user_id.to_string(),
            role_id: role_id.to_string(),
            initiator_id: initiator_id.map(str::to_string),
        };
        let event_key = event_key(user_id)?;
        let encoded_event = encode(&event)?;

        let assigned = (&self.roles, &self.user_roles, &self.role_users, &self.user_events)
            .transaction(|(roles, user_roles, role_users, events)| {
                if roles.get(role_id.as_bytes())?.is_none() {
                    return Err(ConflictableTransactionError::Abort(
                        AuthorizationError::UnknownRole(role_id.to_string()),
                    ));
                }
                if user_roles.get(&key)?.is_some() {
                    return Ok(false);
                }
                user_roles.insert(key.as_slice(), MARKER)?;
                role_users.insert(reverse_key.as_slice(), MARKER)?;
                events.insert(event_key.as_slice(), encoded_event.as_slice())?;
                Ok(true)
            })?;

        if assigned {
            tracing::info!(role_id, user_id, initiator_id, "assigned role to user");
        }
        Ok(())
    }

    pub fn deassign_role_from_user(
        &self,
        role_id: &str,
        user_id: &str,
        initiator_id: Option<&str>,
    ) -> Result<(), AuthorizationError> {
        let key = keys::composite_key(user_id, role_id.as_bytes())?;
        let reverse_key = keys::composite_key(role_id, user_id.as_bytes())?;
        let event = UserEvent {
            occurred_at: Timestamp::now(),
            event_type: UserEventType::RoleDeassigned,
            user_id: user_id.to_string(),
            role_id: role_id.to_string(),
            initiator_id: initiator_id.map(str::to_string),
        };
        let event_key = event_key(user_id)?;
        let encoded_event = encode(&event)?;

        (&self.user_roles, &self.role_users, &self.user_events).transaction(
            |(user_roles, role_users, events)| {
                if user_roles.remove(key.as_slice())?.is_none() {
                    return Err(ConflictableTransactionError::Abort(
                        AuthorizationError::NotAssigned {
                            assignee: role_id.to_string(),
                            target: user_id.to_string(),
                        },
                    ));
                }
                role_users.remove(reverse_key.as_slice())?;
                events.insert(event_key.as_slice(), encoded_event.as_slice())?;
                Ok(())
            },
        )?;

        tracing::info!(role_id, user_id, initiator_id, "deassigned role from user");
        Ok(())
    }

    /// Drop every role the user holds. No events are recorded.
    pub fn deassign_all_roles_from_user(&self, user_id: &str) -> Result<usize, AuthorizationError> {
        let mut user_roles = Batch::default();
        let mut role_users = Batch::default();
        let mut count = 0;
        for key in self.user_roles.scan_prefix(keys::family_prefix(user_id)?).keys() {
            let key = key?;
            if let Some(role_id) = keys::tail_str(&key) {
                role_users.remove(keys::composite_key(role_id, user_id.as_bytes())?);
            }
            user_roles.remove(key);
            count += 1;
        }

        (&self.user_roles, &self.role_users).transaction(|(user_roles_tx, role_users_tx)| {
            user_roles_tx.apply_batch(&user_roles)?;
            role_users_tx.apply_batch(&role_users)?;
            Ok::<_, ConflictableTransactionError<AuthorizationError>>(())
        })?;

        tracing::info!(user_id, count, "deassigned all roles from user");
        Ok(count)
    }

    pub fn find_role_ids_for_user(
        &self,
        user_id: &str,
    ) -> Result<BTreeSet<String>, AuthorizationError> {
        family_tails(&self.user_roles, user_id)
    }

    pub fn find_user_ids_for_role(
        &self,
        role_id: &str,
    ) -> Result<BTreeSet<String>, AuthorizationError> {
        family_tails(&self.role_users, role_id)
    }

    /// Ids of all permissions the user holds through its roles.
    pub fn get_permission_ids_for_user(
        &self,
        user_id: &str,
    ) -> Result<BTreeSet<String>, AuthorizationError> {
        let mut permission_ids = BTreeSet::new();
        for role_id in self.find_role_ids_for_user(user_id)? {
            permission_ids.extend(self.get_permission_ids_for_role(&role_id)?);
        }
        Ok(permission_ids)
    }

    /// Role events for the user, oldest first.
    pub fn get_events_for_user(&self, user_id: &str) -> Result<Vec<UserEvent>, AuthorizationError> {
        self.user_events
            .scan_prefix(keys::family_prefix(user_id)?)
            .values()
            .map(|bytes| decode(&bytes?))
            .collect()
    }
}

/// Answers "may this user do that" from persisted roles and the registry of
/// the running process.
pub struct Authorizer {
    service: Arc<AuthorizationService>,
    registry: Arc<PermissionRegistry>,
}

impl Authorizer {
    pub fn new(service: Arc<AuthorizationService>, registry: Arc<PermissionRegistry>) -> Self {
        Self { service, registry }
    }

    /// Permissions of the user known to this process. Stored ids the registry
    /// cannot resolve are left out.
    pub fn permissions_for_user(
        &self,
        user_id: &str,
    ) -> Result<BTreeSet<Permission>, AuthorizationError> {
        let permission_ids = self.service.get_permission_ids_for_user(user_id)?;
        Ok(self.registry.resolve_many(&permission_ids))
    }

    pub fn has_permission(
        &self,
        user_id: &str,
        permission: &Permission,
    ) -> Result<bool, AuthorizationError> {
        Ok(self.permissions_for_user(user_id)?.contains(permission))
    }
}

fn family_tails(tree: &Tree, head: &str) -> Result<BTreeSet<String>, AuthorizationError> {
    let mut tails = BTreeSet::new();
    for key in tree.scan_prefix(keys::family_prefix(head)?).keys() {
        if let Some(tail) = keys::tail_str(&key?) {
            tails.insert(tail.to_string());
        }
    }
    Ok(tails)
}

// uuid7 keeps a user's events in insertion order
fn event_key(user_id: &str) -> Result<Vec<u8>, AuthorizationError> {
    Ok(keys::composite_key(user_id, uuid7::uuid7().as_bytes())?)
}

fn encode<T: minicbor::Encode<()>>(value: &T) -> Result<Vec<u8>, AuthorizationError> {
    minicbor::to_vec(value).map_err(|e| AuthorizationError::Encoding(e.to_string()))
}

fn decode<'b, T: minicbor::Decode<'b, ()>>(bytes: &'b [u8]) -> Result<T, AuthorizationError> {
    minicbor::decode(bytes).map_err(|e| AuthorizationError::Encoding(e.to_string()))
}
