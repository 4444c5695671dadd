use crate::assembly::{AssemblyOptions, KinshipGraph, LevelAssigner, TreeAssembler, UnknownDatePlacement};
use crate::config::Config;
use crate::dates::PartialDate;
use crate::error::{EngineError, EngineResult};
use crate::filter::{DistanceFilter, EdgeFilter, IncludedPersons};
use crate::service::fanout::{fetch_relations, RawRelations};
use crate::source::GraphSource;
use crate::types::*;
use chrono::{NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub parallel_reads: bool,
    pub female_marker: String,
    pub unknown_marriage_dates: UnknownDatePlacement,
    /// Fixed "today" for ages; the local date when unset.
    pub as_of: Option<NaiveDate>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            parallel_reads: true,
            female_marker: "f".to_string(),
            unknown_marriage_dates: UnknownDatePlacement::MostRecent,
            as_of: None,
        }
    }
}

impl From<&Config> for ServiceConfig {
    fn from(config: &Config) -> Self {
        Self {
            parallel_reads: config.engine.parallel_reads,
            female_marker: config.ordering.female_marker.clone(),
            unknown_marriage_dates: config.ordering.unknown_marriage_dates,
            as_of: config.age.as_of,
        }
    }
}

/// Turns collaborator reads into family tree and graph views.
pub struct FamilyTreeService {
    source: Arc<dyn GraphSource>,
    config: ServiceConfig,
}

/// Persons, inclusion and filtered edges for one request.
struct Selection {
    persons: HashMap<PersonId, Person>,
    included: IncludedPersons,
    relations: Relations,
}

impl FamilyTreeService {
    pub fn new(source: Arc<dyn GraphSource>, config: ServiceConfig) -> Self {
        Self { source, config }
    }

    /// Family tree around `root`, limited to persons within `max_distance` hops.
    #[instrument(skip(self))]
    pub async fn get_family_tree(&self, root: PersonId, max_distance: i64) -> EngineResult<FamilyTreeView> {
        let started = std::time::Instant::now();
        let selection = self.select_rooted(root, max_distance).await?;
        let persons = self.assemble(&selection, Some(root));

        info!("Family tree for {} contains {} persons", root, persons.len());
        record_assembly("family_tree", started);
        Ok(FamilyTreeView { root, persons })
    }

    /// Every person and relation, leveled from an arbitrary seed.
    #[instrument(skip(self))]
    pub async fn get_complete_graph(&self) -> EngineResult<CompleteGraphView> {
        let started = std::time::Instant::now();
        let raw = fetch_relations(&self.source, None, self.config.parallel_reads).await?;

        let included = IncludedPersons::all(raw.persons.iter());
        let seed = raw.relations.parents.first().map(|edge| edge.parent_id);
        let selection = Selection {
            persons: index_persons(raw.persons),
            included,
            relations: raw.relations,
        };
        let persons = self.assemble(&selection, seed);

        info!(
            "Complete graph contains {} persons and {} edges",
            persons.len(),
            selection.relations.edge_count()
        );
        record_assembly("complete_graph", started);
        Ok(GraphView {
            scope: GraphScope::Complete,
            persons,
            relations: selection.relations,
        })
    }

    /// Graph around `root` with the edges between the included persons.
    #[instrument(skip(self))]
    pub async fn get_subgraph(&self, root: PersonId, max_distance: i64) -> EngineResult<SubgraphView> {
        let started = std::time::Instant::now();
        let selection = self.select_rooted(root, max_distance).await?;
        let persons = self.assemble(&selection, Some(root));

        info!(
            "Subgraph for {} contains {} persons and {} edges",
            root,
            persons.len(),
            selection.relations.edge_count()
        );
        record_assembly("subgraph", started);
        Ok(GraphView {
            scope: GraphScope::Subgraph {
                root,
                max_distance: max_distance as u64,
            },
            persons,
            relations: selection.relations,
        })
    }

    /// Check if the collaborator answers
    pub async fn health_check(&self) -> EngineResult<HealthStatus> {
        let healthy = match self.source.health_check().await {
            Ok(healthy) => healthy,
            Err(err) => {
                warn!("Graph source health check failed: {}", err);
                false
            }
        };

        Ok(HealthStatus {
            healthy,
            components: vec![ComponentHealth {
                name: "graph_source".to_string(),
                healthy,
            }],
            timestamp: Utc::now(),
        })
    }

    async fn select_rooted(&self, root: PersonId, max_distance: i64) -> EngineResult<Selection> {
        let max_distance = u64::try_from(max_distance).map_err(|_| {
            EngineError::invalid(format!("max distance must not be negative, got {}", max_distance))
        })?;

        let RawRelations {
            persons,
            relations,
            distances,
        } = fetch_relations(&self.source, Some(root), self.config.parallel_reads).await?;

        let persons = index_persons(persons);
        if !persons.contains_key(&root) {
            return Err(EngineError::NotFound(root));
        }

        let distances = distances.unwrap_or_default();
        let included = DistanceFilter::new(max_distance).select(root, &distances, &persons);
        let relations = EdgeFilter::new(&included).apply(relations);

        Ok(Selection {
            persons,
            included,
            relations,
        })
    }

    fn assemble(&self, selection: &Selection, seed: Option<PersonId>) -> BTreeMap<PersonId, PersonView> {
        let options = self.assembly_options();
        let mut views = TreeAssembler::new(&options).assemble(
            &selection.persons,
            &selection.included,
            &selection.relations,
        );

        match seed {
            Some(seed) => {
                let graph = KinshipGraph::from_parent_edges(&selection.relations.parents);
                debug!(
                    "Kinship graph has {} persons and {} parent edges",
                    graph.node_count(),
                    graph.edge_count()
                );
                if !graph.contains(&seed) {
                    debug!("Seed {} has no parent or child edges", seed);
                }
                LevelAssigner::assign(&graph, seed, &mut views);
            }
            None => debug!("No parent edges, all persons stay on level 0"),
        }

        views
    }

    fn assembly_options(&self) -> AssemblyOptions {
        let today = self
            .config
            .as_of
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        AssemblyOptions {
            female_marker: self.config.female_marker.clone(),
            unknown_marriage_dates: self.config.unknown_marriage_dates,
            reference_date: PartialDate::from_naive(today),
        }
    }
}

fn index_persons(persons: Vec<Person>) -> HashMap<PersonId, Person> {
    let mut map = HashMap::with_capacity(persons.len());
    for person in persons {
        if map.insert(person.id, person).is_some() {
            warn!("Duplicate person record, keeping the last one");
        }
    }
    map
}

fn record_assembly(kind: &'static str, started: std::time::Instant) {
    metrics::counter!("family_tree_views_total", 1, "kind" => kind);
    metrics::histogram!("family_tree_assembly_seconds", started.elapsed().as_secs_f64(), "kind" => kind);
}

#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub healthy: bool,
    pub components: Vec<ComponentHealth>,
    pub timestamp: chrono::DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ComponentHealth {
    pub name: String,
    pub healthy: bool,
}
