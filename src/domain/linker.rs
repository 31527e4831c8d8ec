//! Parent/child linking from a hand-authored group table.
//!
//! Each [`LinkGroup`] names a cluster of requirements. The first member of
//! the cluster becomes the parent of every other member.

use std::collections::BTreeMap;

use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::requirement::{Requirement, RequirementId};

/// A named, ordered cluster of requirement ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GroupDefinition", into = "GroupDefinition")]
pub struct LinkGroup {
    name: String,
    members: NonEmpty<RequirementId>,
}

/// A group was declared without members.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("link group '{0}' has no members")]
pub struct EmptyGroupError(String);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GroupDefinition {
    name: String,
    members: Vec<RequirementId>,
}

impl TryFrom<GroupDefinition> for LinkGroup {
    type Error = EmptyGroupError;

    fn try_from(definition: GroupDefinition) -> Result<Self, Self::Error> {
        let members = NonEmpty::from_vec(definition.members)
            .ok_or_else(|| EmptyGroupError(definition.name.clone()))?;
        Ok(Self {
            name: definition.name,
            members,
        })
    }
}

impl From<LinkGroup> for GroupDefinition {
    fn from(group: LinkGroup) -> Self {
        Self {
            name: group.name,
            members: group.members.into(),
        }
    }
}

impl LinkGroup {
    /// Creates a group.
    #[must_use]
    pub fn new(name: impl Into<String>, members: NonEmpty<RequirementId>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }

    /// The group name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parent of the group.
    #[must_use]
    pub const fn head(&self) -> &RequirementId {
        &self.members.head
    }

    /// The children of the group, in declaration order.
    #[must_use]
    pub fn tail(&self) -> &[RequirementId] {
        &self.members.tail
    }

    /// All members, parent first.
    pub fn members(&self) -> impl Iterator<Item = &RequirementId> {
        self.members.iter()
    }
}

/// The ordered set of groups a [`RelationshipLinker`] applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkGroups(Vec<LinkGroup>);

impl LinkGroups {
    /// Wraps a list of groups.
    #[must_use]
    pub const fn new(groups: Vec<LinkGroup>) -> Self {
        Self(groups)
    }

    /// Iterates the groups in order.
    pub fn iter(&self) -> impl Iterator<Item = &LinkGroup> {
        self.0.iter()
    }

    /// The number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for LinkGroups {
    fn default() -> Self {
        fn group(name: &str, ids: &[&str]) -> LinkGroup {
            let ids: Vec<RequirementId> = ids
                .iter()
                .map(|id| RequirementId::new(*id).expect("built-in ids are non-empty"))
                .collect();
            LinkGroup::new(
                name,
                NonEmpty::from_vec(ids).expect("built-in groups have members"),
            )
        }

        Self(vec![
            group("lifetime", &["RTM-01", "RTM-02", "RTM-03", "RTM-04"]),
            group("steady_state", &["RTM-05"]),
            group(
                "transient",
                &[
                    "RTM-06", "RTM-07", "RTM-08", "RTM-09", "RTM-010", "RTM-011", "RTM-012",
                ],
            ),
            group("other_ops", &["RTM-013", "RTM-014", "RTM-015", "RTM-016"]),
        ])
    }
}

/// What a call to [`RelationshipLinker::link`] changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LinkSummary {
    /// Child requirements whose parent was assigned.
    pub linked: usize,
    /// Group members that matched no requirement.
    pub missing: Vec<RequirementId>,
}

/// Applies a [`LinkGroups`] table to a set of requirements.
///
/// The transform is one-shot and idempotent. It does no cycle detection: a
/// member that is a child in one group and a parent in another is linked as
/// written.
#[derive(Debug, Clone, Default)]
pub struct RelationshipLinker {
    groups: LinkGroups,
}

impl RelationshipLinker {
    /// Creates a linker for the given groups.
    #[must_use]
    pub const fn new(groups: LinkGroups) -> Self {
        Self { groups }
    }

    /// The group table in use.
    #[must_use]
    pub const fn groups(&self) -> &LinkGroups {
        &self.groups
    }

    /// Links `requirements` in place.
    ///
    /// For every group with more than one member the head gains each other
    /// member as a child, and each other member's parents become exactly
    /// the head. Singleton groups change nothing. Ids that match no
    /// requirement are skipped and reported in the summary.
    #[instrument(level = "debug", skip_all, fields(groups = self.groups.len()))]
    pub fn link(&self, requirements: &mut [Requirement]) -> LinkSummary {
        let mut index: BTreeMap<RequirementId, usize> = BTreeMap::new();
        for (position, requirement) in requirements.iter().enumerate() {
            index.entry(requirement.id().clone()).or_insert(position);
        }

        let mut summary = LinkSummary::default();
        for group in self.groups.iter() {
            if group.tail().is_empty() {
                continue;
            }

            let head = group.head();
            let Some(&head_position) = index.get(head) else {
                tracing::warn!(group = group.name(), id = %head, "group parent not found");
                summary.missing.push(head.clone());
                continue;
            };

            for child in group.tail() {
                let Some(&child_position) = index.get(child) else {
                    tracing::warn!(group = group.name(), id = %child, "group member not found");
                    summary.missing.push(child.clone());
                    continue;
                };

                requirements[head_position].add_child(child.clone());
                requirements[child_position].set_parent(head.clone());
                summary.linked += 1;
            }
            tracing::debug!(group = group.name(), parent = %head, children = group.tail().len(), "linked group");
        }
        summary
    }
}
