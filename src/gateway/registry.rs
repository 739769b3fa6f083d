use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use thiserror::Error;

use crate::types::Role;

use super::path_has_prefix;

static NO_PREFIXES: BTreeSet<String> = BTreeSet::new();

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("api root '{0}' must start with '/' and must not end with '/'")]
    InvalidApiRoot(String),
    #[error("role {0} is listed more than once")]
    DuplicateRole(Role),
    #[error("role {0} has no namespace segments")]
    NoSegments(Role),
    #[error("role {role} has invalid segment '{segment}'")]
    InvalidSegment { role: Role, segment: String },
    #[error("segment '{segment}' is claimed by both {first} and {second}")]
    DuplicateSegment { segment: String, first: Role, second: Role },
    #[error("prefix '{prefix}' owned by {role} does not resolve back to {role}")]
    NotInverse { role: Role, prefix: String },
    #[error("failed to read registry file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse registry file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// One row of the registry table as written in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceEntry {
    pub role: Role,
    pub segments: Vec<String>,
}

/// Raw registry table, either built in or loaded from YAML
///
/// ```yaml
/// api_root: /api
/// namespaces:
///   - role: HR
///     segments: [hr]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryTable {
    pub api_root: String,
    pub namespaces: Vec<NamespaceEntry>,
}

impl RegistryTable {
    /// One namespace per role, named after the role
    pub fn builtin(api_root: &str) -> Self {
        Self {
            api_root: api_root.to_string(),
            namespaces: Role::ALL
                .into_iter()
                .map(|role| NamespaceEntry {
                    role,
                    segments: vec![role.default_segment().to_string()],
                })
                .collect(),
        }
    }

    pub fn from_yaml(source: &str) -> Result<Self, RegistryError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, RegistryError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_yaml(&source)
    }
}

/// Immutable bidirectional map between roles and the API namespaces they own.
///
/// Built once at startup. `build` refuses any table whose forward
/// (role -> prefixes) and reverse (segment -> role) views disagree.
#[derive(Debug, Clone)]
pub struct RolePathRegistry {
    api_root: String,
    prefixes_by_role: HashMap<Role, BTreeSet<String>>,
    role_by_segment: HashMap<String, Role>,
}

impl RolePathRegistry {
    pub fn build(table: RegistryTable) -> Result<Self, RegistryError> {
        let api_root = table.api_root;
        if !api_root.starts_with('/') || api_root.ends_with('/') {
            return Err(RegistryError::InvalidApiRoot(api_root));
        }

        let mut prefixes_by_role: HashMap<Role, BTreeSet<String>> = HashMap::new();
        let mut role_by_segment: HashMap<String, Role> = HashMap::new();

        for entry in table.namespaces {
            if prefixes_by_role.contains_key(&entry.role) {
                return Err(RegistryError::DuplicateRole(entry.role));
            }
            if entry.segments.is_empty() {
                return Err(RegistryError::NoSegments(entry.role));
            }

            let mut prefixes = BTreeSet::new();
            for segment in entry.segments {
                if segment.is_empty() || segment.contains('/') || segment.trim() != segment {
                    return Err(RegistryError::InvalidSegment { role: entry.role, segment });
                }
                if let Some(first) = role_by_segment.get(&segment) {
                    return Err(RegistryError::DuplicateSegment {
                        segment,
                        first: *first,
                        second: entry.role,
                    });
                }
                prefixes.insert(format!("{}/{}", api_root, segment));
                role_by_segment.insert(segment, entry.role);
            }
            prefixes_by_role.insert(entry.role, prefixes);
        }

        let registry = Self {
            api_root,
            prefixes_by_role,
            role_by_segment,
        };
        registry.check_inverse()?;
        Ok(registry)
    }

    pub fn builtin(api_root: &str) -> Result<Self, RegistryError> {
        Self::build(RegistryTable::builtin(api_root))
    }

    fn check_inverse(&self) -> Result<(), RegistryError> {
        for (role, prefixes) in &self.prefixes_by_role {
            for prefix in prefixes {
                let resolved = self.required_role_for_path(prefix);
                if resolved != Some(*role) || !self.owns_path(*role, prefix) {
                    return Err(RegistryError::NotInverse { role: *role, prefix: prefix.clone() });
                }
            }
        }
        for (segment, role) in &self.role_by_segment {
            let prefix = format!("{}/{}", self.api_root, segment);
            if !self.owned_prefixes_for(*role).contains(&prefix) {
                return Err(RegistryError::NotInverse { role: *role, prefix });
            }
        }
        Ok(())
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// Prefixes owned by `role`; empty when the table has no row for it.
    pub fn owned_prefixes_for(&self, role: Role) -> &BTreeSet<String> {
        self.prefixes_by_role.get(&role).unwrap_or(&NO_PREFIXES)
    }

    /// Role required to enter `path`, derived from its first segment under the API root.
    ///
    /// Exact, case-sensitive segment match. `None` for anything unregistered.
    pub fn required_role_for_path(&self, path: &str) -> Option<Role> {
        let segment = self.namespace_segment(path)?;
        self.role_by_segment.get(segment).copied()
    }

    /// Segment between the API root and the next `/`
    pub fn namespace_segment<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.api_root.as_str())?.strip_prefix('/')?;
        let segment = rest.split('/').next().unwrap_or_default();
        (!segment.is_empty()).then_some(segment)
    }

    pub fn role_for_segment(&self, segment: &str) -> Option<Role> {
        self.role_by_segment.get(segment).copied()
    }

    /// Whether `path` falls under one of the prefixes owned by `role`
    pub fn owns_path(&self, role: Role, path: &str) -> bool {
        self.owned_prefixes_for(role)
            .iter()
            .any(|prefix| path_has_prefix(path, prefix))
    }

    /// Registered roles with their prefixes, in role order
    pub fn entries(&self) -> Vec<(Role, &BTreeSet<String>)> {
        let mut entries: Vec<_> = self
            .prefixes_by_role
            .iter()
            .map(|(role, prefixes)| (*role, prefixes))
            .collect();
        entries.sort_by_key(|(role, _)| *role);
        entries
    }
}
