use crate::filter::distance::IncludedPersons;
use crate::types::Relations;
use tracing::debug;

/// Restricts relation lists to edges whose endpoints are all included.
pub struct EdgeFilter<'a> {
    included: &'a IncludedPersons,
}

impl<'a> EdgeFilter<'a> {
    pub fn new(included: &'a IncludedPersons) -> Self {
        Self { included }
    }

    pub fn apply(&self, relations: Relations) -> Relations {
        let before = relations.edge_count();
        let included = self.included;

        let restricted = Relations {
            marriages: relations
                .marriages
                .into_iter()
                .filter(|e| included.contains(&e.person1_id) && included.contains(&e.person2_id))
                .collect(),
            parents: relations
                .parents
                .into_iter()
                .filter(|e| included.contains(&e.parent_id) && included.contains(&e.child_id))
                .collect(),
            siblings: relations
                .siblings
                .into_iter()
                .filter(|e| included.contains(&e.person1_id) && included.contains(&e.person2_id))
                .collect(),
        };

        debug!("Edge filter kept {} of {} edges", restricted.edge_count(), before);
        restricted
    }
}
