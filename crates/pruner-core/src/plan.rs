//! Per-key consolidation decisions.
//!
//! A key whose value is shared by at least two non-default profiles is
//! consolidated: the largest group's value is hoisted into the default
//! profile and deleted from that group's members. Profiles outside the
//! winning group keep their own value. A key where every profile holds a
//! distinct value is divergent and only gets an annotation on the default
//! profile. A shared key that would collide with a parent or child path the
//! default profile already holds is blocked: it is annotated and every
//! profile keeps its value.

use std::cmp::Ordering;

use serde_json::Value;

use crate::change::Change;
use crate::classify::MatchGroup;
use crate::flatten::SEPARATOR;

/// Decision for one intersected key.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyPlan {
    /// Hoist `winner.value` into the default profile.
    ///
    /// `changes[0]` is the default profile's set; the rest are deletions
    /// for each winning profile.
    Consolidate {
        winner: MatchGroup,
        changes: Vec<Change>,
    },

    /// No value is shared; annotate the default profile for review.
    Divergent { change: Change },

    /// A value is shared, but the default profile holds `conflict`, a parent
    /// or child path of the key. Only an annotation is recorded.
    Blocked {
        winner: MatchGroup,
        conflict: String,
        change: Change,
    },
}

impl KeyPlan {
    pub fn changes(&self) -> Vec<&Change> {
        match self {
            KeyPlan::Consolidate { changes, .. } => changes.iter().collect(),
            KeyPlan::Divergent { change } | KeyPlan::Blocked { change, .. } => vec![change],
        }
    }

    pub fn into_changes(self) -> Vec<Change> {
        match self {
            KeyPlan::Consolidate { changes, .. } => changes,
            KeyPlan::Divergent { change } | KeyPlan::Blocked { change, .. } => vec![change],
        }
    }
}

/// Order two groups by preference: larger first, then by smallest member name.
fn compare_groups(a: &MatchGroup, b: &MatchGroup) -> Ordering {
    b.len()
        .cmp(&a.len())
        .then_with(|| a.first_profile().cmp(&b.first_profile()))
}

/// Pick the group to hoist, if any group is shared by two or more profiles.
///
/// Ties between equally large groups go to the group whose smallest
/// profile name sorts first.
pub fn select_winner(groups: &[MatchGroup]) -> Option<&MatchGroup> {
    groups
        .iter()
        .filter(|group| group.is_shared())
        .min_by(|a, b| compare_groups(a, b))
}

/// Plan the changes for `key`. Returns `None` when there are no groups.
pub fn plan_key(
    key: &str,
    groups: &[MatchGroup],
    default_value: Option<&Value>,
    default_profile: &str,
) -> Option<KeyPlan> {
    if groups.is_empty() {
        return None;
    }

    let plan = match select_winner(groups) {
        Some(winner) => {
            let message = hoist_message(key, winner, default_value);
            let mut changes = Vec::with_capacity(winner.len() + 1);
            changes.push(Change::set(
                default_profile,
                key,
                winner.value.clone(),
                message.clone(),
            ));
            for profile in &winner.profiles {
                changes.push(Change::delete(
                    profile.as_str(),
                    key,
                    winner.value.clone(),
                    message.clone(),
                ));
            }
            KeyPlan::Consolidate {
                winner: winner.clone(),
                changes,
            }
        }
        None => KeyPlan::Divergent {
            change: Change::annotate(default_profile, key, divergent_message(key, groups)),
        },
    };
    Some(plan)
}

/// True when one path is a strict dotted prefix of the other.
pub fn paths_conflict(a: &str, b: &str) -> bool {
    fn is_parent(parent: &str, child: &str) -> bool {
        child.len() > parent.len()
            && child.starts_with(parent)
            && child[parent.len()..].starts_with(SEPARATOR)
    }
    is_parent(a, b) || is_parent(b, a)
}

/// Turn a consolidation of `key` into an annotation when `default_keys`
/// holds a conflicting path. Other plans pass through unchanged.
pub fn guard_default_paths<'a, I>(plan: KeyPlan, key: &str, default_keys: I, default_profile: &str) -> KeyPlan
where
    I: IntoIterator<Item = &'a String>,
{
    let conflict = match &plan {
        KeyPlan::Consolidate { .. } => default_keys
            .into_iter()
            .find(|existing| paths_conflict(existing, key)),
        _ => None,
    };
    match (plan, conflict) {
        (KeyPlan::Consolidate { winner, .. }, Some(conflict)) => KeyPlan::Blocked {
            change: Change::annotate(default_profile, key, blocked_message(key, &winner, conflict)),
            conflict: conflict.clone(),
            winner,
        },
        (plan, _) => plan,
    }
}

fn blocked_message(key: &str, winner: &MatchGroup, conflict: &str) -> String {
    format!(
        "The property {} is equivalent across profiles {} with the shared value of {}, but the default profile already defines {}. The value is left in place.",
        key,
        winner.profiles.join(","),
        winner.value,
        conflict
    )
}

fn hoist_message(key: &str, winner: &MatchGroup, default_value: Option<&Value>) -> String {
    let mut message = format!(
        "The property {} is equivalent across profiles {}. The shared value of {} is being added to the default profile.",
        key,
        winner.profiles.join(","),
        winner.value
    );
    if let Some(previous) = default_value {
        if *previous != winner.value {
            message.push_str(&format!(" It replaces the previous default value of {}.", previous));
        }
    }
    message
}

fn divergent_message(key: &str, groups: &[MatchGroup]) -> String {
    let mut message = format!("The property {} is set with different values on all profiles", key);
    for group in groups {
        message.push_str(&format!(
            " {{Profile : {} => {}}}",
            group.profiles.join(","),
            group.value
        ));
    }
    message
}
