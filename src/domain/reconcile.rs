//! Set difference between persisted and desired membership.

use super::{Id, Member};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation<T> {
    /// `target \ current`, in target order.
    pub to_add: Vec<T>,
    /// `current \ target`, in current order.
    pub to_remove: Vec<T>,
}

impl<T> Reconciliation<T> {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Computes the minimal add/remove sets turning `current` into `target`.
/// Duplicates on either side collapse to a single member.
pub fn reconcile<T: Copy + Eq + Hash>(current: &[T], target: &[T]) -> Reconciliation<T> {
    let current_set: HashSet<T> = current.iter().copied().collect();
    let target_set: HashSet<T> = target.iter().copied().collect();

    Reconciliation {
        to_add: distinct(target.iter().filter(|t| !current_set.contains(*t))),
        to_remove: distinct(current.iter().filter(|c| !target_set.contains(*c))),
    }
}

fn distinct<'a, T: Copy + Eq + Hash + 'a>(items: impl Iterator<Item = &'a T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items.filter(|item| seen.insert(**item)).copied().collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberDiff {
    pub to_add: Vec<Member>,
    pub to_remove: Vec<Member>,
    /// Members kept on both sides whose `is_primary` changed; carries the target value.
    pub to_update: Vec<Member>,
}

impl MemberDiff {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty() && self.to_update.is_empty()
    }
}

/// Membership diff keyed by account id. The first occurrence of an id wins.
pub fn reconcile_members(current: &[Member], target: &[Member]) -> MemberDiff {
    let current_by_id = first_by_id(current);
    let target_by_id = first_by_id(target);

    let current_ids: Vec<Id> = current.iter().map(|m| m.account_id).collect();
    let target_ids: Vec<Id> = target.iter().map(|m| m.account_id).collect();
    let ids = reconcile(&current_ids, &target_ids);

    let to_update = distinct(target_ids.iter())
        .into_iter()
        .filter_map(|id| {
            let before = current_by_id.get(&id)?;
            let after = target_by_id.get(&id)?;
            (before.is_primary != after.is_primary).then_some(*after)
        })
        .collect();

    MemberDiff {
        to_add: ids.to_add.iter().map(|id| target_by_id[id]).collect(),
        to_remove: ids.to_remove.iter().map(|id| current_by_id[id]).collect(),
        to_update,
    }
}

fn first_by_id(members: &[Member]) -> HashMap<Id, Member> {
    let mut by_id = HashMap::with_capacity(members.len());
    for member in members {
        by_id.entry(member.account_id).or_insert(*member);
    }
    by_id
}
