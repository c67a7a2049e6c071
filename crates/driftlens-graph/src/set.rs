//! Set algebra over opaque node identifiers
//!
//! Bounded-degree traversal plus union/intersection, with no knowledge of
//! lineage semantics - neighbors come from a caller-supplied lookup so the
//! same traversal serves upstream and downstream selection.

use driftlens_core::NodeId;
use std::collections::{BTreeSet, HashMap};

/// Remaining traversal budget: bounded hop count or unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Budget {
    Bounded(usize),
    Unbounded,
}

impl Budget {
    fn spend(self) -> Option<Budget> {
        match self {
            Budget::Unbounded => Some(Budget::Unbounded),
            Budget::Bounded(0) => None,
            Budget::Bounded(n) => Some(Budget::Bounded(n - 1)),
        }
    }
}

/// Depth-bounded, seed-inclusive neighbor set.
///
/// Walks depth-first from every seed, following `get_neighbors`, visiting
/// at most `max_degree` hops from any seed (`None` = unbounded). A node
/// already visited with an equal-or-greater remaining budget is not
/// revisited. Seeds themselves are always included, even at degree 0.
/// Ids with no neighbors (including ids unknown to the caller's graph)
/// simply terminate the walk there.
pub fn neighbor_set<F>(
    seed_ids: &[NodeId],
    get_neighbors: F,
    max_degree: Option<usize>,
) -> BTreeSet<NodeId>
where
    F: Fn(&str) -> Vec<NodeId>,
{
    let budget = match max_degree {
        Some(d) => Budget::Bounded(d),
        None => Budget::Unbounded,
    };

    let mut result = BTreeSet::new();
    let mut best_seen: HashMap<NodeId, Budget> = HashMap::new();

    for seed in seed_ids {
        visit(seed, budget, &get_neighbors, &mut best_seen, &mut result);
    }

    result
}

fn visit<F>(
    id: &str,
    budget: Budget,
    get_neighbors: &F,
    best_seen: &mut HashMap<NodeId, Budget>,
    result: &mut BTreeSet<NodeId>,
) where
    F: Fn(&str) -> Vec<NodeId>,
{
    match best_seen.get(id) {
        Some(&seen) if seen >= budget => return,
        _ => {}
    }
    best_seen.insert(id.to_string(), budget);

    if let Some(remaining) = budget.spend() {
        for neighbor in get_neighbors(id) {
            visit(&neighbor, remaining, get_neighbors, best_seen, result);
        }
    }

    // Post-order insert keeps the seed included even at degree 0
    result.insert(id.to_string());
}

/// Union of any number of sets; empty input yields the empty set
pub fn union(sets: &[BTreeSet<NodeId>]) -> BTreeSet<NodeId> {
    let mut result = BTreeSet::new();
    for set in sets {
        result.extend(set.iter().cloned());
    }
    result
}

/// Intersection of any number of sets; empty input yields the empty set
pub fn intersect(sets: &[BTreeSet<NodeId>]) -> BTreeSet<NodeId> {
    let Some((first, rest)) = sets.split_first() else {
        return BTreeSet::new();
    };

    first
        .iter()
        .filter(|id| rest.iter().all(|set| set.contains(*id)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(items: &[&str]) -> Vec<NodeId> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn set(items: &[&str]) -> BTreeSet<NodeId> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// a -> b -> c -> d chain
    fn chain_neighbors(id: &str) -> Vec<NodeId> {
        match id {
            "a" => ids(&["b"]),
            "b" => ids(&["c"]),
            "c" => ids(&["d"]),
            _ => vec![],
        }
    }

    #[test]
    fn degree_zero_is_just_the_seeds() {
        let result = neighbor_set(&ids(&["a"]), chain_neighbors, Some(0));
        assert_eq!(result, set(&["a"]));
    }

    #[test]
    fn bounded_degree_cuts_the_walk() {
        let result = neighbor_set(&ids(&["a"]), chain_neighbors, Some(2));
        assert_eq!(result, set(&["a", "b", "c"]));
    }

    #[test]
    fn unbounded_reaches_everything() {
        let result = neighbor_set(&ids(&["a"]), chain_neighbors, None);
        assert_eq!(result, set(&["a", "b", "c", "d"]));
    }

    #[test]
    fn degree_is_monotonic() {
        let unbounded = neighbor_set(&ids(&["a"]), chain_neighbors, None);
        for d in 0..5 {
            let bounded = neighbor_set(&ids(&["a"]), chain_neighbors, Some(d));
            assert!(bounded.is_subset(&unbounded), "degree {} not a subset", d);
        }
    }

    #[test]
    fn unknown_seed_still_included() {
        let result = neighbor_set(&ids(&["ghost"]), chain_neighbors, None);
        assert_eq!(result, set(&["ghost"]));
    }

    #[test]
    fn revisit_with_more_budget_goes_deeper() {
        // Two paths into c: a -> c directly and a -> b -> c. If the direct
        // visit (more remaining budget) came second it must still expand c.
        let diamond = |id: &str| -> Vec<NodeId> {
            match id {
                "a" => ids(&["b", "c"]),
                "b" => ids(&["c"]),
                "c" => ids(&["d"]),
                _ => vec![],
            }
        };

        let result = neighbor_set(&ids(&["a"]), diamond, Some(2));
        // b's visit of c arrives with 0 budget left, a's direct visit with 1,
        // so d is reachable either way.
        assert_eq!(result, set(&["a", "b", "c", "d"]));
    }

    #[test]
    fn cycles_terminate() {
        let cyclic = |id: &str| -> Vec<NodeId> {
            match id {
                "a" => ids(&["b"]),
                "b" => ids(&["a"]),
                _ => vec![],
            }
        };

        let result = neighbor_set(&ids(&["a"]), cyclic, None);
        assert_eq!(result, set(&["a", "b"]));
    }

    #[test]
    fn union_covers_all_inputs() {
        let a = set(&["x", "y"]);
        let b = set(&["y", "z"]);
        let result = union(&[a.clone(), b.clone()]);

        assert!(result.is_superset(&a));
        assert!(result.is_superset(&b));
        assert_eq!(result, set(&["x", "y", "z"]));
        assert!(union(&[]).is_empty());
    }

    #[test]
    fn intersect_is_exact() {
        let a = set(&["x", "y", "z"]);
        let b = set(&["y", "z", "w"]);
        let c = set(&["z", "y"]);

        assert_eq!(intersect(&[a, b, c]), set(&["y", "z"]));
        assert!(intersect(&[]).is_empty());
    }
}
