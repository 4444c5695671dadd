use crate::error::{EngineError, EngineResult, FetchFailure};
use crate::source::{GraphSource, SourceResult};
use crate::types::{GraphDistance, MarriageEdge, ParentEdge, Person, PersonId, Relations, SiblingEdge};
use futures::future::OptionFuture;
use std::future::Future;
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, instrument, warn};

const PERSONS: &str = "persons";
const MARRIAGES: &str = "marriage edges";
const PARENTS: &str = "parent edges";
const SIBLINGS: &str = "sibling edges";
const DISTANCES: &str = "shortest distances";

/// The unfiltered collections a view is assembled from.
#[derive(Debug, Clone, Default)]
pub struct RawRelations {
    pub persons: Vec<Person>,
    pub relations: Relations,
    /// Present for rooted reads only.
    pub distances: Option<Vec<GraphDistance>>,
}

/// One slot per read; each is written by exactly one task.
struct ReadSlots {
    persons: EngineResult<Vec<Person>>,
    marriages: EngineResult<Vec<MarriageEdge>>,
    parents: EngineResult<Vec<ParentEdge>>,
    siblings: EngineResult<Vec<SiblingEdge>>,
    distances: Option<EngineResult<Vec<GraphDistance>>>,
}

impl ReadSlots {
    fn failures(&self) -> Vec<&EngineError> {
        [
            self.persons.as_ref().err(),
            self.marriages.as_ref().err(),
            self.parents.as_ref().err(),
            self.siblings.as_ref().err(),
            self.distances.as_ref().and_then(|d| d.as_ref().err()),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// First failure in read order wins; nothing partial escapes.
    fn into_relations(self) -> EngineResult<RawRelations> {
        Ok(RawRelations {
            persons: self.persons?,
            relations: Relations {
                marriages: self.marriages?,
                parents: self.parents?,
                siblings: self.siblings?,
            },
            distances: self.distances.transpose()?,
        })
    }
}

/// Issues every read the view needs and waits for all of them.
///
/// Reads never cancel each other: a failing read does not stop the others,
/// and the outcome is decided only once every read has finished.
#[instrument(skip(source))]
pub async fn fetch_relations(
    source: &Arc<dyn GraphSource>,
    root: Option<PersonId>,
    parallel: bool,
) -> EngineResult<RawRelations> {
    let task_count = if root.is_some() { 5 } else { 4 };
    let slots = if parallel {
        debug!("Issuing {} reads in parallel", task_count);
        read_parallel(source, root).await
    } else {
        debug!("Issuing {} reads sequentially", task_count);
        read_sequential(source.as_ref(), root).await
    };

    let failures = slots.failures();
    if !failures.is_empty() {
        for failure in &failures {
            warn!("Read failed: {}", failure);
        }
        metrics::counter!("family_tree_read_failures_total", failures.len() as u64);
        info!("{} of {} reads failed, aborting assembly", failures.len(), task_count);
    }

    slots.into_relations()
}

async fn read_parallel(source: &Arc<dyn GraphSource>, root: Option<PersonId>) -> ReadSlots {
    let persons = spawn_read(source, |s| async move { s.fetch_all_persons().await });
    let marriages = spawn_read(source, |s| async move { s.fetch_all_marriage_edges().await });
    let parents = spawn_read(source, |s| async move { s.fetch_all_parent_edges().await });
    let siblings = spawn_read(source, |s| async move { s.fetch_all_sibling_edges().await });
    let distances = root.map(|id| {
        spawn_read(source, move |s| async move { s.fetch_shortest_distances(id).await })
    });

    let (persons, marriages, parents, siblings, distances) = futures::join!(
        persons,
        marriages,
        parents,
        siblings,
        OptionFuture::from(distances)
    );

    ReadSlots {
        persons: settle(PERSONS, persons),
        marriages: settle(MARRIAGES, marriages),
        parents: settle(PARENTS, parents),
        siblings: settle(SIBLINGS, siblings),
        distances: distances.map(|joined| settle(DISTANCES, joined)),
    }
}

async fn read_sequential(source: &dyn GraphSource, root: Option<PersonId>) -> ReadSlots {
    let persons = source.fetch_all_persons().await;
    let marriages = source.fetch_all_marriage_edges().await;
    let parents = source.fetch_all_parent_edges().await;
    let siblings = source.fetch_all_sibling_edges().await;
    let distances = match root {
        Some(id) => Some(source.fetch_shortest_distances(id).await),
        None => None,
    };

    ReadSlots {
        persons: settle(PERSONS, Ok(persons)),
        marriages: settle(MARRIAGES, Ok(marriages)),
        parents: settle(PARENTS, Ok(parents)),
        siblings: settle(SIBLINGS, Ok(siblings)),
        distances: distances.map(|read| settle(DISTANCES, Ok(read))),
    }
}

fn spawn_read<T, F, Fut>(source: &Arc<dyn GraphSource>, read: F) -> JoinHandle<SourceResult<T>>
where
    F: FnOnce(Arc<dyn GraphSource>) -> Fut,
    Fut: Future<Output = SourceResult<T>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(read(Arc::clone(source)))
}

fn settle<T>(task: &'static str, joined: Result<SourceResult<T>, JoinError>) -> EngineResult<T> {
    match joined {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(EngineError::internal(task, FetchFailure::Source(err))),
        Err(err) => Err(EngineError::internal(task, FetchFailure::Join(err))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::source::interfaces::MockGraphSource;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use uuid::Uuid;

    fn healthy_mock() -> MockGraphSource {
        let mut mock = MockGraphSource::new();
        mock.expect_fetch_all_persons()
            .times(1)
            .returning(|| Ok(vec![Person::new(Uuid::nil())]));
        mock.expect_fetch_all_marriage_edges().times(1).returning(|| Ok(Vec::new()));
        mock.expect_fetch_all_parent_edges().times(1).returning(|| Ok(Vec::new()));
        mock.expect_fetch_all_sibling_edges().times(1).returning(|| Ok(Vec::new()));
        mock
    }

    #[tokio::test]
    async fn test_rooted_read_includes_distances() {
        let root = Uuid::nil();
        let mut mock = healthy_mock();
        mock.expect_fetch_shortest_distances()
            .withf(move |id| *id == root)
            .times(1)
            .returning(|_| Ok(Vec::new()));
        let source: Arc<dyn GraphSource> = Arc::new(mock);

        let raw = fetch_relations(&source, Some(root), true).await.unwrap();

        assert_eq!(raw.persons.len(), 1);
        assert_eq!(raw.distances, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_unrooted_read_skips_distances() {
        let mut mock = healthy_mock();
        mock.expect_fetch_shortest_distances().never();
        let source: Arc<dyn GraphSource> = Arc::new(mock);

        let raw = fetch_relations(&source, None, true).await.unwrap();

        assert!(raw.distances.is_none());
    }

    #[tokio::test]
    async fn test_sequential_failure_reports_first_error() {
        let mut mock = MockGraphSource::new();
        mock.expect_fetch_all_persons().returning(|| Ok(Vec::new()));
        mock.expect_fetch_all_marriage_edges()
            .returning(|| Err(SourceError::query("marriages broke")));
        mock.expect_fetch_all_parent_edges()
            .times(1)
            .returning(|| Err(SourceError::query("parents broke")));
        mock.expect_fetch_all_sibling_edges().times(1).returning(|| Ok(Vec::new()));
        let source: Arc<dyn GraphSource> = Arc::new(mock);

        let err = fetch_relations(&source, None, false).await.unwrap_err();

        match err {
            EngineError::Internal { task, .. } => assert_eq!(task, MARRIAGES),
            other => panic!("unexpected error: {other}"),
        }
    }

    /// Fails fast on persons while the other reads take their time.
    struct SlowSource {
        finished: Arc<AtomicUsize>,
        distances_done: Arc<AtomicBool>,
    }

    impl SlowSource {
        async fn slow<T>(&self, value: T) -> SourceResult<T> {
            tokio::time::sleep(Duration::from_millis(30)).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(value)
        }
    }

    #[async_trait]
    impl GraphSource for SlowSource {
        async fn fetch_all_persons(&self) -> SourceResult<Vec<Person>> {
            Err(SourceError::unavailable("persons offline"))
        }

        async fn fetch_all_marriage_edges(&self) -> SourceResult<Vec<MarriageEdge>> {
            self.slow(Vec::new()).await
        }

        async fn fetch_all_parent_edges(&self) -> SourceResult<Vec<ParentEdge>> {
            self.slow(Vec::new()).await
        }

        async fn fetch_all_sibling_edges(&self) -> SourceResult<Vec<SiblingEdge>> {
            self.slow(Vec::new()).await
        }

        async fn fetch_shortest_distances(&self, _root: PersonId) -> SourceResult<Vec<GraphDistance>> {
            let result = self.slow(Vec::new()).await;
            self.distances_done.store(true, Ordering::SeqCst);
            result
        }
    }

    #[tokio::test]
    async fn test_failing_read_does_not_cancel_others() {
        let finished = Arc::new(AtomicUsize::new(0));
        let distances_done = Arc::new(AtomicBool::new(false));
        let source: Arc<dyn GraphSource> = Arc::new(SlowSource {
            finished: finished.clone(),
            distances_done: distances_done.clone(),
        });

        let result = fetch_relations(&source, Some(Uuid::new_v4()), true).await;

        assert!(matches!(result, Err(EngineError::Internal { task: PERSONS, .. })));
        assert_eq!(finished.load(Ordering::SeqCst), 4);
        assert!(distances_done.load(Ordering::SeqCst));
    }
}
