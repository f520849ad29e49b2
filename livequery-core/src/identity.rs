//! Requesting identity for per-row authorization.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Who is asking.
///
/// Resolved once per query, before any row is visited, so authorization
/// can be decided from the row and the identity alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Identity {
    /// No user supplied: every row is visible.
    #[default]
    Unrestricted,
    /// A user name that does not match any known contact: nothing is visible.
    Unknown { name: String },
    /// A known contact with its resolved contact-group memberships.
    Contact {
        name: String,
        groups: BTreeSet<String>,
    },
}

impl Identity {
    /// Build a contact identity.
    pub fn contact<I, S>(name: impl Into<String>, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Identity::Contact {
            name: name.into(),
            groups: groups.into_iter().map(Into::into).collect(),
        }
    }

    pub fn unknown(name: impl Into<String>) -> Self {
        Identity::Unknown { name: name.into() }
    }

    /// The user name, if one was supplied.
    pub fn name(&self) -> Option<&str> {
        match self {
            Identity::Unrestricted => None,
            Identity::Unknown { name } | Identity::Contact { name, .. } => Some(name.as_str()),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Identity::Unrestricted)
    }

    /// Whether this identity is a contact and a member of `group`.
    pub fn is_member_of(&self, group: &str) -> bool {
        match self {
            Identity::Contact { groups, .. } => groups.contains(group),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_membership() {
        let identity = Identity::contact("alice", ["admins", "ops"]);
        assert_eq!(identity.name(), Some("alice"));
        assert!(identity.is_member_of("ops"));
        assert!(!identity.is_member_of("dev"));
        assert!(!identity.is_unrestricted());
    }

    #[test]
    fn test_unknown_and_unrestricted() {
        assert_eq!(Identity::unknown("mallory").name(), Some("mallory"));
        assert!(!Identity::unknown("mallory").is_member_of("ops"));
        assert!(Identity::default().is_unrestricted());
        assert_eq!(Identity::Unrestricted.name(), None);
    }
}
