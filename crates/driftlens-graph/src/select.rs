//! Selection service: upstream/downstream expansion over the merged graph

use crate::set::neighbor_set;
use crate::types::MergedGraph;
use driftlens_core::NodeId;
use std::collections::BTreeSet;

/// Seed-inclusive upstream selection (ancestors within `degree` hops).
///
/// `degree = None` walks to the roots. Callers wanting strict ancestors
/// subtract the seed set from the result.
pub fn select_upstream(
    graph: &MergedGraph,
    seed_ids: &[NodeId],
    degree: Option<usize>,
) -> BTreeSet<NodeId> {
    neighbor_set(seed_ids, |id| graph.parent_ids(id), degree)
}

/// Seed-inclusive downstream selection (descendants within `degree` hops)
pub fn select_downstream(
    graph: &MergedGraph,
    seed_ids: &[NodeId],
    degree: Option<usize>,
) -> BTreeSet<NodeId> {
    neighbor_set(seed_ids, |id| graph.child_ids(id), degree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::build_merged_graph;
    use driftlens_core::EnvInput;
    use std::collections::BTreeMap;

    /// a -> b -> c, a -> d
    fn graph() -> MergedGraph {
        let mut parent_map = BTreeMap::new();
        parent_map.insert("a".to_string(), vec![]);
        parent_map.insert("b".to_string(), vec!["a".to_string()]);
        parent_map.insert("c".to_string(), vec!["b".to_string()]);
        parent_map.insert("d".to_string(), vec!["a".to_string()]);
        let env = EnvInput::from_parent_map(parent_map);

        build_merged_graph(&env, &env)
    }

    fn set(items: &[&str]) -> BTreeSet<NodeId> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn upstream_degree_zero_is_identity() {
        let g = graph();
        assert_eq!(select_upstream(&g, &["c".to_string()], Some(0)), set(&["c"]));
    }

    #[test]
    fn upstream_walks_parents() {
        let g = graph();
        assert_eq!(select_upstream(&g, &["c".to_string()], Some(1)), set(&["b", "c"]));
        assert_eq!(select_upstream(&g, &["c".to_string()], None), set(&["a", "b", "c"]));
    }

    #[test]
    fn downstream_walks_children() {
        let g = graph();
        assert_eq!(
            select_downstream(&g, &["a".to_string()], None),
            set(&["a", "b", "c", "d"])
        );
        assert_eq!(
            select_downstream(&g, &["a".to_string()], Some(1)),
            set(&["a", "b", "d"])
        );
    }

    #[test]
    fn strict_descendants_by_subtracting_seeds() {
        let g = graph();
        let mut result = select_downstream(&g, &["a".to_string()], None);
        result.remove("a");
        assert_eq!(result, set(&["b", "c", "d"]));
    }

    #[test]
    fn multiple_seeds_union_their_walks() {
        let g = graph();
        let seeds = vec!["b".to_string(), "d".to_string()];
        assert_eq!(select_upstream(&g, &seeds, Some(1)), set(&["a", "b", "d"]));
    }

    #[test]
    fn unknown_seed_is_not_an_error() {
        let g = graph();
        assert_eq!(
            select_upstream(&g, &["ghost".to_string()], None),
            set(&["ghost"])
        );
    }
}
