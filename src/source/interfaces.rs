use crate::error::SourceError;
use crate::types::{GraphDistance, MarriageEdge, ParentEdge, Person, PersonId, SiblingEdge};
use async_trait::async_trait;

pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Read side of the graph store the engine assembles views from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GraphSource: Send + Sync {
    async fn fetch_all_persons(&self) -> SourceResult<Vec<Person>>;

    async fn fetch_all_marriage_edges(&self) -> SourceResult<Vec<MarriageEdge>>;

    async fn fetch_all_parent_edges(&self) -> SourceResult<Vec<ParentEdge>>;

    async fn fetch_all_sibling_edges(&self) -> SourceResult<Vec<SiblingEdge>>;

    /// Hop counts from `root` to every reachable person, sorted ascending by
    /// distance.
    async fn fetch_shortest_distances(&self, root: PersonId) -> SourceResult<Vec<GraphDistance>>;

    /// Check if the store is reachable
    async fn health_check(&self) -> SourceResult<bool> {
        Ok(true)
    }
}
