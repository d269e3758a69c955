// Label bookkeeping: condition resolution and cluster grouping
//
// Both label vectors share the observation index space with the distance
// matrix. Report order is first-appearance order, so grouping keeps a
// position map instead of relying on hash iteration order.

use crate::error::{HeterogeneityError, Result};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Observation indices belonging to one cluster, in index order
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ClusterGroup<C> {
    pub label: C,
    pub members: Vec<usize>,
}

/// Resolve the two condition values in first-appearance order
///
/// Fails unless exactly two distinct values are present.
pub(crate) fn resolve_conditions<K: Clone + Eq + Hash>(conditions: &[K]) -> Result<(K, K)> {
    let mut seen: Vec<&K> = Vec::with_capacity(2);
    let mut extra = HashSet::new();

    for label in conditions {
        if seen.contains(&label) || extra.contains(label) {
            continue;
        }
        if seen.len() < 2 {
            seen.push(label);
        } else {
            extra.insert(label);
        }
    }

    match seen.as_slice() {
        [a, b] if extra.is_empty() => Ok(((*a).clone(), (*b).clone())),
        _ => Err(HeterogeneityError::ConditionCount {
            found: seen.len() + extra.len(),
        }),
    }
}

/// Group observation indices by cluster label, in first-appearance order
pub(crate) fn group_clusters<C: Clone + Eq + Hash>(clusters: &[C]) -> Vec<ClusterGroup<C>> {
    let mut position: HashMap<&C, usize> = HashMap::new();
    let mut groups: Vec<ClusterGroup<C>> = Vec::new();

    for (index, label) in clusters.iter().enumerate() {
        let slot = *position.entry(label).or_insert_with(|| {
            groups.push(ClusterGroup {
                label: label.clone(),
                members: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].members.push(index);
    }

    groups
}

/// Symmetric size balance of the two condition sides: min / max, 0 if a side is empty
pub(crate) fn condition_ratio(count_a: usize, count_b: usize) -> f32 {
    let (low, high) = (count_a.min(count_b), count_a.max(count_b));
    if low == 0 {
        0.0
    } else {
        low as f32 / high as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_conditions_first_appearance() {
        let (a, b) = resolve_conditions(&["post", "pre", "post", "pre"]).unwrap();
        assert_eq!(a, "post");
        assert_eq!(b, "pre");
    }

    #[test]
    fn test_resolve_conditions_single_value() {
        let err = resolve_conditions(&["ctrl", "ctrl"]).unwrap_err();
        assert_eq!(err, HeterogeneityError::ConditionCount { found: 1 });
    }

    #[test]
    fn test_resolve_conditions_three_values() {
        let err = resolve_conditions(&[1, 2, 3, 1, 3]).unwrap_err();
        assert_eq!(err, HeterogeneityError::ConditionCount { found: 3 });
    }

    #[test]
    fn test_resolve_conditions_empty() {
        let err = resolve_conditions::<u8>(&[]).unwrap_err();
        assert_eq!(err, HeterogeneityError::ConditionCount { found: 0 });
    }

    #[test]
    fn test_group_clusters_order_and_members() {
        let groups = group_clusters(&[7, 3, 7, 9, 3]);
        let labels: Vec<i32> = groups.iter().map(|g| g.label).collect();
        assert_eq!(labels, vec![7, 3, 9]);
        assert_eq!(groups[0].members, vec![0, 2]);
        assert_eq!(groups[1].members, vec![1, 4]);
        assert_eq!(groups[2].members, vec![3]);
    }

    #[test]
    fn test_condition_ratio() {
        assert_eq!(condition_ratio(5, 5), 1.0);
        assert_eq!(condition_ratio(2, 8), 0.25);
        assert_eq!(condition_ratio(8, 2), 0.25);
        assert_eq!(condition_ratio(0, 4), 0.0);
        assert_eq!(condition_ratio(3, 0), 0.0);
    }
}
