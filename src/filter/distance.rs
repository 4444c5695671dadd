use crate::types::{GraphDistance, Person, PersonId};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Person ids admitted to a view, with their hop distance from the root when
/// the view is rooted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludedPersons {
    ids: BTreeMap<PersonId, Option<u64>>,
}

impl IncludedPersons {
    /// Every person, without distance metadata.
    pub fn all<'a>(persons: impl IntoIterator<Item = &'a Person>) -> Self {
        Self {
            ids: persons.into_iter().map(|p| (p.id, None)).collect(),
        }
    }

    pub fn contains(&self, id: &PersonId) -> bool {
        self.ids.contains_key(id)
    }

    pub fn distance(&self, id: &PersonId) -> Option<u64> {
        self.ids.get(id).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PersonId, &Option<u64>)> {
        self.ids.iter()
    }
}

/// Selects the persons within a hop budget of a root.
#[derive(Debug, Clone, Copy)]
pub struct DistanceFilter {
    max_distance: u64,
}

impl DistanceFilter {
    pub fn new(max_distance: u64) -> Self {
        Self { max_distance }
    }

    pub fn max_distance(&self) -> u64 {
        self.max_distance
    }

    /// Admit `root` at distance 0 plus every listed person within the bound.
    ///
    /// The whole list is scanned, so an unsorted or duplicated list from the
    /// store cannot drop anyone. Duplicates keep their smallest distance and
    /// ids unknown to `persons` are skipped.
    pub fn select(
        &self,
        root: PersonId,
        distances: &[GraphDistance],
        persons: &HashMap<PersonId, Person>,
    ) -> IncludedPersons {
        let mut ids = BTreeMap::new();
        ids.insert(root, Some(0));

        if distances.windows(2).any(|pair| pair[0].distance > pair[1].distance) {
            debug!("Distance list for {} is not sorted ascending", root);
        }

        for entry in distances {
            if entry.distance > self.max_distance {
                continue;
            }
            if !persons.contains_key(&entry.person_id) {
                warn!("Skipping distance entry for unknown person {}", entry.person_id);
                continue;
            }

            match ids.entry(entry.person_id) {
                Entry::Vacant(slot) => {
                    slot.insert(Some(entry.distance));
                }
                Entry::Occupied(mut slot) => {
                    let current = slot.get_mut();
                    if current.map_or(true, |d| entry.distance < d) {
                        *current = Some(entry.distance);
                    }
                }
            }
        }

        debug!(
            "Selected {} persons within distance {} of {}",
            ids.len(),
            self.max_distance,
            root
        );
        IncludedPersons { ids }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn people(count: usize) -> (Vec<PersonId>, HashMap<PersonId, Person>) {
        let ids: Vec<PersonId> = (0..count).map(|_| Uuid::new_v4()).collect();
        let map = ids.iter().map(|id| (*id, Person::new(*id))).collect();
        (ids, map)
    }

    fn hop(person_id: PersonId, distance: u64) -> GraphDistance {
        GraphDistance { person_id, distance }
    }

    #[test]
    fn test_select_within_bound() {
        let (ids, persons) = people(4);
        let distances = vec![hop(ids[1], 1), hop(ids[2], 2), hop(ids[3], 3)];

        let included = DistanceFilter::new(2).select(ids[0], &distances, &persons);

        assert_eq!(included.len(), 3);
        assert_eq!(included.distance(&ids[0]), Some(0));
        assert_eq!(included.distance(&ids[2]), Some(2));
        assert!(!included.contains(&ids[3]));
    }

    #[test]
    fn test_zero_distance_keeps_only_root() {
        let (ids, persons) = people(3);
        let distances = vec![hop(ids[1], 1), hop(ids[2], 1)];

        let included = DistanceFilter::new(0).select(ids[0], &distances, &persons);

        assert_eq!(included.len(), 1);
        assert!(included.contains(&ids[0]));
    }

    #[test]
    fn test_unsorted_list_does_not_drop_persons() {
        let (ids, persons) = people(4);
        let distances = vec![hop(ids[1], 5), hop(ids[2], 1), hop(ids[3], 2)];

        let included = DistanceFilter::new(2).select(ids[0], &distances, &persons);

        assert!(included.contains(&ids[2]));
        assert!(included.contains(&ids[3]));
        assert!(!included.contains(&ids[1]));
    }

    #[test]
    fn test_duplicates_keep_minimum_and_root_stays_zero() {
        let (ids, persons) = people(2);
        let distances = vec![hop(ids[0], 2), hop(ids[1], 3), hop(ids[1], 1)];

        let included = DistanceFilter::new(5).select(ids[0], &distances, &persons);

        assert_eq!(included.distance(&ids[0]), Some(0));
        assert_eq!(included.distance(&ids[1]), Some(1));
    }

    #[test]
    fn test_unknown_ids_are_skipped() {
        let (ids, persons) = people(1);
        let stranger = Uuid::new_v4();

        let included = DistanceFilter::new(5).select(ids[0], &[hop(stranger, 1)], &persons);

        assert!(!included.contains(&stranger));
    }

    #[test]
    fn test_all_has_no_distances() {
        let (ids, persons) = people(3);
        let included = IncludedPersons::all(persons.values());

        assert_eq!(included.len(), 3);
        assert!(ids.iter().all(|id| included.contains(id) && included.distance(id).is_none()));
    }
}
