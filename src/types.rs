use crate::dates::PartialDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Core types for the family tree engine

pub type PersonId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: PersonId,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub birth_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub is_dead: Option<bool>,
    #[serde(default)]
    pub birth_date: PartialDate,
    #[serde(default)]
    pub death_date: PartialDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarriageEdge {
    pub person1_id: PersonId,
    pub person2_id: PersonId,
    #[serde(default)]
    pub since: PartialDate,
    #[serde(default)]
    pub until: PartialDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentEdge {
    pub parent_id: PersonId,
    pub child_id: PersonId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiblingEdge {
    pub person1_id: PersonId,
    pub person2_id: PersonId,
    #[serde(default)]
    pub is_half: bool,
}

/// Shortest-path hop count from a root, as reported by the graph store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDistance {
    pub person_id: PersonId,
    pub distance: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiblingRef {
    pub id: PersonId,
    pub is_half: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpouseRef {
    pub id: PersonId,
    pub since: PartialDate,
    pub until: PartialDate,
}

/// A person together with everything derived for display. Relations are
/// held as ids only; the owning view map resolves them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonView {
    #[serde(flatten)]
    pub person: Person,
    pub age: Option<i32>,
    pub generation_level: i32,
    pub distance: Option<u64>,
    pub parents: Vec<PersonId>,
    pub children: Vec<PersonId>,
    pub siblings: Vec<SiblingRef>,
    pub spouses: Vec<SpouseRef>,
}

impl PersonView {
    pub fn new(person: Person, distance: Option<u64>, age: Option<i32>) -> Self {
        Self {
            person,
            age,
            generation_level: 0,
            distance,
            parents: Vec::new(),
            children: Vec::new(),
            siblings: Vec::new(),
            spouses: Vec::new(),
        }
    }

    pub fn id(&self) -> PersonId {
        self.person.id
    }
}

/// Edge lists after restriction to an included person set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relations {
    pub marriages: Vec<MarriageEdge>,
    pub parents: Vec<ParentEdge>,
    pub siblings: Vec<SiblingEdge>,
}

impl Relations {
    pub fn edge_count(&self) -> usize {
        self.marriages.len() + self.parents.len() + self.siblings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edge_count() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyTreeView {
    pub root: PersonId,
    pub persons: BTreeMap<PersonId, PersonView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GraphScope {
    Complete,
    #[serde(rename_all = "camelCase")]
    Subgraph { root: PersonId, max_distance: u64 },
}

/// Graph-shaped response: leveled persons plus the retained edge lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphView {
    pub scope: GraphScope,
    pub persons: BTreeMap<PersonId, PersonView>,
    #[serde(flatten)]
    pub relations: Relations,
}

pub type CompleteGraphView = GraphView;
pub type SubgraphView = GraphView;

/// Common read access for anything made of leveled person views.
pub trait LeveledView {
    fn root(&self) -> Option<PersonId>;
    fn persons(&self) -> &BTreeMap<PersonId, PersonView>;

    fn person(&self, id: &PersonId) -> Option<&PersonView> {
        self.persons().get(id)
    }

    fn len(&self) -> usize {
        self.persons().len()
    }

    fn is_empty(&self) -> bool {
        self.persons().is_empty()
    }
}

impl LeveledView for FamilyTreeView {
    fn root(&self) -> Option<PersonId> {
        Some(self.root)
    }

    fn persons(&self) -> &BTreeMap<PersonId, PersonView> {
        &self.persons
    }
}

impl LeveledView for GraphView {
    fn root(&self) -> Option<PersonId> {
        match self.scope {
            GraphScope::Complete => None,
            GraphScope::Subgraph { root, .. } => Some(root),
        }
    }

    fn persons(&self) -> &BTreeMap<PersonId, PersonView> {
        &self.persons
    }
}

impl Person {
    pub fn new(id: PersonId) -> Self {
        Self {
            id,
            first_name: None,
            middle_name: None,
            last_name: None,
            birth_name: None,
            gender: None,
            is_dead: None,
            birth_date: PartialDate::default(),
            death_date: PartialDate::default(),
        }
    }

    pub fn is_dead(&self) -> bool {
        self.is_dead.unwrap_or(false)
    }

    pub fn has_gender(&self, marker: &str) -> bool {
        self.gender.as_deref() == Some(marker)
    }
}

impl MarriageEdge {
    pub fn touches(&self, id: &PersonId) -> bool {
        self.person1_id == *id || self.person2_id == *id
    }
}

impl SiblingEdge {
    pub fn touches(&self, id: &PersonId) -> bool {
        self.person1_id == *id || self.person2_id == *id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_view_serializes_flat_camel_case() {
        let mut person = Person::new(Uuid::nil());
        person.first_name = Some("Ada".to_string());
        person.birth_date = PartialDate::ymd(1815, 12, 10);
        let view = PersonView::new(person, Some(0), Some(36));

        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["generationLevel"], 0);
        assert_eq!(json["birthDate"]["year"], 1815);
        assert!(json.get("person").is_none());
    }

    #[test]
    fn test_graph_view_root_follows_scope() {
        let root = Uuid::new_v4();
        let subgraph = GraphView {
            scope: GraphScope::Subgraph { root, max_distance: 2 },
            persons: BTreeMap::new(),
            relations: Relations::default(),
        };
        let complete = GraphView {
            scope: GraphScope::Complete,
            ..subgraph.clone()
        };

        assert_eq!(subgraph.root(), Some(root));
        assert_eq!(complete.root(), None);
        assert!(complete.is_empty());
    }

    #[test]
    fn test_person_deserializes_with_missing_optionals() {
        let id = Uuid::new_v4();
        let person: Person = serde_json::from_str(&format!(r#"{{"id":"{}"}}"#, id)).unwrap();

        assert_eq!(person.id, id);
        assert!(!person.is_dead());
        assert!(person.birth_date.is_empty());
    }
}
