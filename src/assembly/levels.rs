use crate::assembly::graph::KinshipGraph;
use crate::types::{PersonId, PersonView};
use std::collections::{BTreeMap, HashSet, VecDeque};
use tracing::debug;

/// Assigns generation levels relative to a seed person.
pub struct LevelAssigner;

impl LevelAssigner {
    /// Breadth-first walk from `seed` at level 0: parents one level up,
    /// children one level down. Each person is leveled once, so reconverging
    /// lines and malformed cycles terminate. Persons never reached keep their
    /// current level. Returns the number of persons visited.
    pub fn assign(
        graph: &KinshipGraph,
        seed: PersonId,
        views: &mut BTreeMap<PersonId, PersonView>,
    ) -> usize {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();

        visited.insert(seed);
        queue.push_back((seed, 0i32));

        while let Some((current, level)) = queue.pop_front() {
            if let Some(view) = views.get_mut(&current) {
                view.generation_level = level;
            }

            for parent in graph.parents_of(&current) {
                if visited.insert(parent) {
                    queue.push_back((parent, level - 1));
                }
            }
            for child in graph.children_of(&current) {
                if visited.insert(child) {
                    queue.push_back((child, level + 1));
                }
            }
        }

        debug!("Assigned generation levels to {} persons from {}", visited.len(), seed);
        visited.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ParentEdge, Person};
    use uuid::Uuid;

    fn views_for(ids: &[PersonId]) -> BTreeMap<PersonId, PersonView> {
        ids.iter()
            .map(|id| (*id, PersonView::new(Person::new(*id), None, None)))
            .collect()
    }

    fn edge(parent_id: PersonId, child_id: PersonId) -> ParentEdge {
        ParentEdge { parent_id, child_id }
    }

    fn level(views: &BTreeMap<PersonId, PersonView>, id: &PersonId) -> i32 {
        views[id].generation_level
    }

    #[test]
    fn test_levels_relative_to_seed() {
        let ids: Vec<PersonId> = (0..5).map(|_| Uuid::new_v4()).collect();
        let (grandma, mum, me, kid, aunt) = (ids[0], ids[1], ids[2], ids[3], ids[4]);
        let graph = KinshipGraph::from_parent_edges(&[
            edge(grandma, mum),
            edge(grandma, aunt),
            edge(mum, me),
            edge(me, kid),
        ]);
        let mut views = views_for(&ids);

        let visited = LevelAssigner::assign(&graph, me, &mut views);

        assert_eq!(visited, 5);
        assert_eq!(level(&views, &grandma), -2);
        assert_eq!(level(&views, &mum), -1);
        assert_eq!(level(&views, &me), 0);
        assert_eq!(level(&views, &kid), 1);
        assert_eq!(level(&views, &aunt), -1);
    }

    #[test]
    fn test_cycle_terminates() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let graph = KinshipGraph::from_parent_edges(&[edge(a, b), edge(b, a)]);
        let mut views = views_for(&[a, b]);

        assert_eq!(LevelAssigner::assign(&graph, a, &mut views), 2);
        assert_eq!(level(&views, &a), 0);
    }

    #[test]
    fn test_seed_without_edges_is_level_zero() {
        let lonely = Uuid::new_v4();
        let graph = KinshipGraph::from_parent_edges(&[]);
        let mut views = views_for(&[lonely]);
        views.get_mut(&lonely).unwrap().generation_level = 7;

        LevelAssigner::assign(&graph, lonely, &mut views);

        assert_eq!(level(&views, &lonely), 0);
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let ids: Vec<PersonId> = (0..4).map(|_| Uuid::new_v4()).collect();
        // two routes to the same descendant through a second marriage
        let graph = KinshipGraph::from_parent_edges(&[
            edge(ids[0], ids[2]),
            edge(ids[1], ids[2]),
            edge(ids[1], ids[3]),
            edge(ids[2], ids[3]),
        ]);
        let mut first = views_for(&ids);
        let mut second = views_for(&ids);

        LevelAssigner::assign(&graph, ids[0], &mut first);
        LevelAssigner::assign(&graph, ids[0], &mut second);

        assert_eq!(first, second);
    }
}
