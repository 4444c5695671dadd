pub mod coordinator;
pub mod fanout;

pub use coordinator::{ComponentHealth, FamilyTreeService, HealthStatus, ServiceConfig};
pub use fanout::{fetch_relations, RawRelations};
