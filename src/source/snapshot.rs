use crate::assembly::KinshipGraph;
use crate::error::SourceError;
use crate::source::interfaces::{GraphSource, SourceResult};
use crate::types::{GraphDistance, MarriageEdge, ParentEdge, Person, PersonId, SiblingEdge};
use async_trait::async_trait;
use petgraph::algo::dijkstra;
use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

/// Everything the graph store holds, as one serializable document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub persons: Vec<Person>,
    #[serde(default)]
    pub marriages: Vec<MarriageEdge>,
    #[serde(default)]
    pub parents: Vec<ParentEdge>,
    /// Inferred from shared parents when absent.
    #[serde(default)]
    pub siblings: Option<Vec<SiblingEdge>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    DuplicatePerson,
    DanglingEdge,
    InvalidDate,
    ParentCycle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotIssue {
    pub kind: IssueKind,
    pub message: String,
}

impl SnapshotIssue {
    fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl Snapshot {
    /// Load a snapshot; `.yml`/`.yaml` files are read as YAML, anything else
    /// as JSON.
    pub async fn load<P: AsRef<Path>>(path: P) -> SourceResult<Self> {
        let path = path.as_ref();
        debug!("Loading snapshot from: {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yml") | Some("yaml")
        );
        let snapshot: Snapshot = if is_yaml {
            serde_yaml::from_str(&content).map_err(|e| SourceError::parse(e.to_string()))?
        } else {
            serde_json::from_str(&content).map_err(|e| SourceError::parse(e.to_string()))?
        };

        info!(
            "Loaded snapshot with {} persons, {} marriages, {} parent edges",
            snapshot.persons.len(),
            snapshot.marriages.len(),
            snapshot.parents.len()
        );
        Ok(snapshot)
    }

    /// Recorded sibling edges, or edges inferred from shared parents.
    pub fn sibling_edges(&self) -> Vec<SiblingEdge> {
        match &self.siblings {
            Some(siblings) => siblings.clone(),
            None => infer_sibling_edges(&self.parents),
        }
    }

    /// Hop counts over all relation kinds, ignoring edge direction. Sorted
    /// ascending by distance, ties by id; the root itself is not listed.
    pub fn shortest_distances(&self, root: PersonId, siblings: &[SiblingEdge]) -> Vec<GraphDistance> {
        let mut graph: UnGraph<PersonId, ()> = UnGraph::new_undirected();
        let mut node_map: HashMap<PersonId, NodeIndex> = HashMap::new();
        for person in &self.persons {
            node_map
                .entry(person.id)
                .or_insert_with(|| graph.add_node(person.id));
        }

        let Some(&start) = node_map.get(&root) else {
            return Vec::new();
        };

        let pairs = self
            .marriages
            .iter()
            .map(|e| (e.person1_id, e.person2_id))
            .chain(self.parents.iter().map(|e| (e.parent_id, e.child_id)))
            .chain(siblings.iter().map(|e| (e.person1_id, e.person2_id)));
        for (a, b) in pairs {
            if let (Some(&a), Some(&b)) = (node_map.get(&a), node_map.get(&b)) {
                graph.add_edge(a, b, ());
            }
        }

        let mut distances: Vec<GraphDistance> = dijkstra(&graph, start, None, |_| 1u64)
            .into_iter()
            .filter(|(node, _)| *node != start)
            .filter_map(|(node, distance)| {
                graph
                    .node_weight(node)
                    .map(|id| GraphDistance { person_id: *id, distance })
            })
            .collect();
        distances.sort_by(|a, b| a.distance.cmp(&b.distance).then(a.person_id.cmp(&b.person_id)));
        distances
    }

    pub fn validate(&self) -> Vec<SnapshotIssue> {
        let mut issues = Vec::new();
        let mut ids = HashSet::new();

        for person in &self.persons {
            if !ids.insert(person.id) {
                issues.push(SnapshotIssue::new(
                    IssueKind::DuplicatePerson,
                    format!("person {} is listed more than once", person.id),
                ));
            }
            for (label, date) in [("birth", &person.birth_date), ("death", &person.death_date)] {
                if let Some(problem) = date.validate() {
                    issues.push(SnapshotIssue::new(
                        IssueKind::InvalidDate,
                        format!("{} date of {}: {}", label, person.id, problem),
                    ));
                }
            }
        }

        let mut dangling = |kind: &str, a: PersonId, b: PersonId| {
            for id in [a, b] {
                if !ids.contains(&id) {
                    issues.push(SnapshotIssue::new(
                        IssueKind::DanglingEdge,
                        format!("{} edge {} - {} references unknown person {}", kind, a, b, id),
                    ));
                }
            }
        };
        for edge in &self.marriages {
            dangling("marriage", edge.person1_id, edge.person2_id);
        }
        for edge in &self.parents {
            dangling("parent", edge.parent_id, edge.child_id);
        }
        for edge in self.siblings.iter().flatten() {
            dangling("sibling", edge.person1_id, edge.person2_id);
        }

        for edge in &self.marriages {
            for (label, date) in [("since", &edge.since), ("until", &edge.until)] {
                if let Some(problem) = date.validate() {
                    issues.push(SnapshotIssue::new(
                        IssueKind::InvalidDate,
                        format!(
                            "marriage {} - {} {} date: {}",
                            edge.person1_id, edge.person2_id, label, problem
                        ),
                    ));
                }
            }
        }

        if KinshipGraph::from_parent_edges(&self.parents).has_cycle() {
            issues.push(SnapshotIssue::new(
                IssueKind::ParentCycle,
                "parent edges contain a cycle",
            ));
        }

        issues
    }
}

/// One edge per unordered pair of persons sharing a recorded parent;
/// `is_half` when they share exactly one.
pub fn infer_sibling_edges(parents: &[ParentEdge]) -> Vec<SiblingEdge> {
    let mut parents_of: BTreeMap<PersonId, BTreeSet<PersonId>> = BTreeMap::new();
    let mut children_of: BTreeMap<PersonId, BTreeSet<PersonId>> = BTreeMap::new();
    for edge in parents {
        parents_of.entry(edge.child_id).or_default().insert(edge.parent_id);
        children_of.entry(edge.parent_id).or_default().insert(edge.child_id);
    }

    let mut pairs = BTreeSet::new();
    for children in children_of.values() {
        for a in children {
            for b in children.range((std::ops::Bound::Excluded(*a), std::ops::Bound::Unbounded)) {
                pairs.insert((*a, *b));
            }
        }
    }

    pairs
        .into_iter()
        .map(|(a, b)| {
            let shared = match (parents_of.get(&a), parents_of.get(&b)) {
                (Some(pa), Some(pb)) => pa.intersection(pb).count(),
                _ => 0,
            };
            SiblingEdge {
                person1_id: a,
                person2_id: b,
                is_half: shared == 1,
            }
        })
        .collect()
}

/// In-process graph store backed by a [`Snapshot`].
pub struct SnapshotSource {
    snapshot: Snapshot,
    siblings: Vec<SiblingEdge>,
}

impl SnapshotSource {
    pub fn new(snapshot: Snapshot) -> Self {
        let siblings = snapshot.sibling_edges();
        Self { snapshot, siblings }
    }

    pub async fn load<P: AsRef<Path>>(path: P) -> SourceResult<Self> {
        Ok(Self::new(Snapshot::load(path).await?))
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}

#[async_trait]
impl GraphSource for SnapshotSource {
    async fn fetch_all_persons(&self) -> SourceResult<Vec<Person>> {
        Ok(self.snapshot.persons.clone())
    }

    async fn fetch_all_marriage_edges(&self) -> SourceResult<Vec<MarriageEdge>> {
        Ok(self.snapshot.marriages.clone())
    }

    async fn fetch_all_parent_edges(&self) -> SourceResult<Vec<ParentEdge>> {
        Ok(self.snapshot.parents.clone())
    }

    async fn fetch_all_sibling_edges(&self) -> SourceResult<Vec<SiblingEdge>> {
        Ok(self.siblings.clone())
    }

    async fn fetch_shortest_distances(&self, root: PersonId) -> SourceResult<Vec<GraphDistance>> {
        Ok(self.snapshot.shortest_distances(root, &self.siblings))
    }
}
