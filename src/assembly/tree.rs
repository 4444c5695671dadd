use crate::dates::{age_of, compare_missing_last, PartialDate};
use crate::filter::IncludedPersons;
use crate::types::{Person, PersonId, PersonView, Relations, SiblingRef, SpouseRef};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Where marriages with unknown since-date components land in the
/// most-recent-first spouse order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownDatePlacement {
    /// Unknown components count as the largest value, so they rank as the
    /// most recent marriage.
    #[default]
    MostRecent,
    Last,
}

#[derive(Debug, Clone)]
pub struct AssemblyOptions {
    /// Gender code that moves a parent to the second slot.
    pub female_marker: String,
    pub unknown_marriage_dates: UnknownDatePlacement,
    /// "Today" for the ages of living persons.
    pub reference_date: PartialDate,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            female_marker: "f".to_string(),
            unknown_marriage_dates: UnknownDatePlacement::default(),
            reference_date: PartialDate::from_naive(chrono::Local::now().date_naive()),
        }
    }
}

/// Builds per-person parent/child/sibling/spouse views.
pub struct TreeAssembler<'a> {
    options: &'a AssemblyOptions,
}

impl<'a> TreeAssembler<'a> {
    pub fn new(options: &'a AssemblyOptions) -> Self {
        Self { options }
    }

    pub fn assemble(
        &self,
        persons: &HashMap<PersonId, Person>,
        included: &IncludedPersons,
        relations: &Relations,
    ) -> BTreeMap<PersonId, PersonView> {
        let mut views = BTreeMap::new();

        for (id, distance) in included.iter() {
            let Some(person) = persons.get(id) else {
                warn!("Included person {} has no record, leaving it out", id);
                continue;
            };
            let age = age_of(person, &self.options.reference_date);
            views.insert(*id, PersonView::new(person.clone(), *distance, age));
        }

        self.relate_spouses(&mut views, relations);
        self.relate_parents_and_children(&mut views, persons, relations);
        self.relate_siblings(&mut views, persons, relations);

        debug!("Assembled {} person views", views.len());
        views
    }

    fn relate_spouses(&self, views: &mut BTreeMap<PersonId, PersonView>, relations: &Relations) {
        for marriage in &relations.marriages {
            if marriage.person1_id == marriage.person2_id {
                continue;
            }
            let pairs = [
                (marriage.person1_id, marriage.person2_id),
                (marriage.person2_id, marriage.person1_id),
            ];
            for (owner, other) in pairs {
                if let Some(view) = views.get_mut(&owner) {
                    let spouse = SpouseRef {
                        id: other,
                        since: marriage.since,
                        until: marriage.until,
                    };
                    if !view.spouses.contains(&spouse) {
                        view.spouses.push(spouse);
                    }
                }
            }
        }

        let placement = self.options.unknown_marriage_dates;
        for view in views.values_mut() {
            view.spouses
                .sort_by(|a, b| compare_most_recent_first(&a.since, &b.since, placement));
        }
    }

    fn relate_parents_and_children(
        &self,
        views: &mut BTreeMap<PersonId, PersonView>,
        persons: &HashMap<PersonId, Person>,
        relations: &Relations,
    ) {
        for edge in &relations.parents {
            if edge.parent_id == edge.child_id {
                debug!("Ignoring self parent edge on {}", edge.parent_id);
                continue;
            }
            if let Some(parent) = views.get_mut(&edge.parent_id) {
                if !parent.children.contains(&edge.child_id) {
                    parent.children.push(edge.child_id);
                }
            }
            if let Some(child) = views.get_mut(&edge.child_id) {
                if !child.parents.contains(&edge.parent_id) {
                    child.parents.push(edge.parent_id);
                }
            }
        }

        let marker = self.options.female_marker.as_str();
        for view in views.values_mut() {
            if view.parents.len() == 2 {
                let first_is_female = persons
                    .get(&view.parents[0])
                    .map_or(false, |p| p.has_gender(marker));
                if first_is_female {
                    view.parents.swap(0, 1);
                }
            }
            view.children
                .sort_by(|a, b| compare_by_birth_date(persons, a, b));
        }
    }

    fn relate_siblings(
        &self,
        views: &mut BTreeMap<PersonId, PersonView>,
        persons: &HashMap<PersonId, Person>,
        relations: &Relations,
    ) {
        for edge in &relations.siblings {
            if edge.person1_id == edge.person2_id {
                continue;
            }
            let pairs = [
                (edge.person1_id, edge.person2_id),
                (edge.person2_id, edge.person1_id),
            ];
            for (owner, other) in pairs {
                if let Some(view) = views.get_mut(&owner) {
                    if !view.siblings.iter().any(|s| s.id == other) {
                        view.siblings.push(SiblingRef {
                            id: other,
                            is_half: edge.is_half,
                        });
                    }
                }
            }
        }

        for view in views.values_mut() {
            view.siblings
                .sort_by(|a, b| compare_by_birth_date(persons, &a.id, &b.id));
        }
    }
}

/// Ascending birth date, unknown components last. Persons without a record
/// compare as fully unknown.
fn compare_by_birth_date(persons: &HashMap<PersonId, Person>, a: &PersonId, b: &PersonId) -> Ordering {
    let birth = |id: &PersonId| persons.get(id).map(|p| p.birth_date).unwrap_or_default();
    compare_missing_last(&birth(a), &birth(b))
}

fn compare_most_recent_first(a: &PartialDate, b: &PartialDate, placement: UnknownDatePlacement) -> Ordering {
    match placement {
        UnknownDatePlacement::MostRecent => compare_missing_last(b, a),
        UnknownDatePlacement::Last => {
            let key = |d: &PartialDate| {
                (
                    d.year.map_or(i64::MIN, i64::from),
                    d.month.map_or(i64::MIN, i64::from),
                    d.day.map_or(i64::MIN, i64::from),
                )
            };
            key(b).cmp(&key(a))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MarriageEdge, ParentEdge, SiblingEdge};
    use uuid::Uuid;

    struct Fixture {
        persons: HashMap<PersonId, Person>,
        options: AssemblyOptions,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                persons: HashMap::new(),
                options: AssemblyOptions {
                    reference_date: PartialDate::ymd(2024, 6, 15),
                    ..AssemblyOptions::default()
                },
            }
        }

        fn add(&mut self, gender: Option<&str>, birth: PartialDate) -> PersonId {
            let id = Uuid::new_v4();
            let mut person = Person::new(id);
            person.gender = gender.map(str::to_string);
            person.birth_date = birth;
            self.persons.insert(id, person);
            id
        }

        fn assemble(&self, relations: &Relations) -> BTreeMap<PersonId, PersonView> {
            let included = IncludedPersons::all(self.persons.values());
            TreeAssembler::new(&self.options).assemble(&self.persons, &included, relations)
        }
    }

    fn parent(parent_id: PersonId, child_id: PersonId) -> ParentEdge {
        ParentEdge { parent_id, child_id }
    }

    fn marriage(a: PersonId, b: PersonId, since: PartialDate) -> MarriageEdge {
        MarriageEdge {
            person1_id: a,
            person2_id: b,
            since,
            until: PartialDate::default(),
        }
    }

    #[test]
    fn test_female_first_parent_moves_second() {
        let mut fx = Fixture::new();
        let mum = fx.add(Some("f"), PartialDate::default());
        let dad = fx.add(Some("m"), PartialDate::default());
        let kid = fx.add(None, PartialDate::default());
        let other_kid = fx.add(None, PartialDate::default());

        let relations = Relations {
            parents: vec![
                parent(mum, kid),
                parent(dad, kid),
                parent(dad, other_kid),
                parent(mum, other_kid),
            ],
            ..Relations::default()
        };
        let views = fx.assemble(&relations);

        assert_eq!(views[&kid].parents, vec![dad, mum]);
        assert_eq!(views[&other_kid].parents, vec![dad, mum]);
    }

    #[test]
    fn test_single_parent_and_unknown_gender_untouched() {
        let mut fx = Fixture::new();
        let mum = fx.add(Some("f"), PartialDate::default());
        let unknown = fx.add(None, PartialDate::default());
        let other = fx.add(Some("x"), PartialDate::default());
        let only_child = fx.add(None, PartialDate::default());
        let kid = fx.add(None, PartialDate::default());

        let relations = Relations {
            parents: vec![parent(mum, only_child), parent(unknown, kid), parent(other, kid)],
            ..Relations::default()
        };
        let views = fx.assemble(&relations);

        assert_eq!(views[&only_child].parents, vec![mum]);
        assert_eq!(views[&kid].parents, vec![unknown, other]);
    }

    #[test]
    fn test_children_sorted_by_birth_unknown_last() {
        let mut fx = Fixture::new();
        let mum = fx.add(Some("f"), PartialDate::default());
        let unknown = fx.add(None, PartialDate::default());
        let late = fx.add(None, PartialDate::ymd(1995, 2, 1));
        let early = fx.add(None, PartialDate::ymd(1990, 7, 9));
        let partial = fx.add(None, PartialDate::year_only(1995));

        let relations = Relations {
            parents: vec![
                parent(mum, unknown),
                parent(mum, late),
                parent(mum, early),
                parent(mum, partial),
            ],
            ..Relations::default()
        };
        let views = fx.assemble(&relations);

        assert_eq!(views[&mum].children, vec![early, late, partial, unknown]);
    }

    #[test]
    fn test_sibling_symmetry_and_order() {
        let mut fx = Fixture::new();
        let a = fx.add(None, PartialDate::year_only(1980));
        let b = fx.add(None, PartialDate::year_only(1975));
        let c = fx.add(None, PartialDate::year_only(1970));

        let relations = Relations {
            siblings: vec![
                SiblingEdge { person1_id: a, person2_id: b, is_half: true },
                SiblingEdge { person1_id: a, person2_id: c, is_half: false },
            ],
            ..Relations::default()
        };
        let views = fx.assemble(&relations);

        assert_eq!(
            views[&a].siblings,
            vec![SiblingRef { id: c, is_half: false }, SiblingRef { id: b, is_half: true }]
        );
        assert_eq!(views[&b].siblings, vec![SiblingRef { id: a, is_half: true }]);
        assert_eq!(views[&c].siblings, vec![SiblingRef { id: a, is_half: false }]);
    }

    #[test]
    fn test_spouses_most_recent_first_with_unknown_as_most_recent() {
        let mut fx = Fixture::new();
        let me = fx.add(None, PartialDate::default());
        let first = fx.add(None, PartialDate::default());
        let second = fx.add(None, PartialDate::default());
        let undated = fx.add(None, PartialDate::default());

        let relations = Relations {
            marriages: vec![
                marriage(me, first, PartialDate::ymd(1990, 5, 1)),
                marriage(second, me, PartialDate::ymd(2001, 3, 2)),
                marriage(me, undated, PartialDate::default()),
            ],
            ..Relations::default()
        };
        let views = fx.assemble(&relations);
        let order: Vec<PersonId> = views[&me].spouses.iter().map(|s| s.id).collect();

        assert_eq!(order, vec![undated, second, first]);
        assert_eq!(views[&second].spouses[0].since, PartialDate::ymd(2001, 3, 2));
        assert_eq!(views[&second].spouses[0].id, me);
    }

    #[test]
    fn test_unknown_marriage_dates_can_sort_last() {
        let mut fx = Fixture::new();
        fx.options.unknown_marriage_dates = UnknownDatePlacement::Last;
        let me = fx.add(None, PartialDate::default());
        let first = fx.add(None, PartialDate::default());
        let undated = fx.add(None, PartialDate::default());

        let relations = Relations {
            marriages: vec![
                marriage(me, undated, PartialDate::default()),
                marriage(me, first, PartialDate::ymd(1990, 5, 1)),
            ],
            ..Relations::default()
        };
        let views = fx.assemble(&relations);
        let order: Vec<PersonId> = views[&me].spouses.iter().map(|s| s.id).collect();

        assert_eq!(order, vec![first, undated]);
    }

    #[test]
    fn test_duplicate_and_self_edges_are_dropped() {
        let mut fx = Fixture::new();
        let a = fx.add(None, PartialDate::default());
        let b = fx.add(None, PartialDate::default());

        let relations = Relations {
            parents: vec![parent(a, b), parent(a, b), parent(a, a)],
            siblings: vec![SiblingEdge { person1_id: b, person2_id: b, is_half: false }],
            marriages: vec![marriage(a, b, PartialDate::default()), marriage(a, b, PartialDate::default())],
        };
        let views = fx.assemble(&relations);

        assert_eq!(views[&a].children, vec![b]);
        assert!(views[&a].parents.is_empty());
        assert!(views[&b].siblings.is_empty());
        assert_eq!(views[&b].spouses.len(), 1);
    }

    #[test]
    fn test_ages_are_derived() {
        let mut fx = Fixture::new();
        let born = fx.add(None, PartialDate::ymd(2000, 1, 1));
        let unknown = fx.add(None, PartialDate::default());

        let views = fx.assemble(&Relations::default());

        assert_eq!(views[&born].age, Some(24));
        assert_eq!(views[&unknown].age, None);
    }
}
