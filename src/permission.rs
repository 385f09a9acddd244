//! Permission groups and their members
use std::fmt;

use super::error::RegistryError;

/// One granted capability, written `<group>.<name>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Permission {
    group: String,
    name: String,
}

impl Permission {
    pub fn group(&self) -> &str {
        &self.group
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionMember {
    pub name: String,
    pub title: Option<String>,
}

/// A named, ordered set of permissions, e.g. `tourney_category` with
/// `create`, `update` and `view`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionGroup {
    key: String,
    members: Vec<PermissionMember>,
}

impl PermissionGroup {
    pub fn new<S: AsRef<str>>(key: &str, names: &[S]) -> Result<Self, RegistryError> {
        let members = names
            .iter()
            .map(|name| PermissionMember {
                name: name.as_ref().to_string(),
                title: None,
            })
            .collect();
        Self::from_members(key, members)
    }

    pub fn with_titles(key: &str, members: &[(&str, &str)]) -> Result<Self, RegistryError> {
        let members = members
            .iter()
            .map(|(name, title)| PermissionMember {
                name: name.to_string(),
                title: Some(title.to_string()),
            })
            .collect();
        Self::from_members(key, members)
    }

    fn from_members(key: &str, members: Vec<PermissionMember>) -> Result<Self, RegistryError> {
        if !is_valid_identifier(key) {
            return Err(RegistryError::InvalidKey(key.to_string()));
        }
        for (i, member) in members.iter().enumerate() {
            if !is_valid_identifier(&member.name) {
                return Err(RegistryError::InvalidMember {
                    key: key.to_string(),
                    member: member.name.clone(),
                });
            }
            if members[..i].iter().any(|m| m.name == member.name) {
                return Err(RegistryError::DuplicateMember {
                    key: key.to_string(),
                    member: member.name.clone(),
                });
            }
        }
        Ok(Self {
            key: key.to_string(),
            members,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn members(&self) -> &[PermissionMember] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<Permission> {
        self.members
            .iter()
            .find(|m| m.name == name)
            .map(|m| Permission {
                group: self.key.clone(),
                name: m.name.clone(),
            })
    }

    pub fn permissions(&self) -> impl Iterator<Item = Permission> + '_ {
        self.members.iter().map(|m| Permission {
            group: self.key.clone(),
            name: m.name.clone(),
        })
    }

    /// `CamelCase` name derived from the key: `tourney_category` becomes
    /// `TourneyCategoryPermission`.
    pub fn type_name(&self) -> String {
        self.key
            .split('_')
            .chain(std::iter::once("permission"))
            .map(title_case)
            .collect()
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

// the dot separates group from name, so neither may contain one
fn is_valid_identifier(s: &str) -> bool {
    !s.is_empty() && !s.contains('.') && !s.chars().any(char::is_whitespace)
}
