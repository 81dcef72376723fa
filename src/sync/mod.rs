//! Opportunistic mirroring of cloud writes into the local store.
//!
//! - `ReplicationRoutes` maps registered route patterns to entity kinds
//! - `dual_write_layer` inspects successful write responses
//! - `Replicator` repeats the write against the local store on a detached task
//! - `Connectivity` gates all of it on the online flag
//!
//! Nothing here retries, queues or orders writes; a missed replication stays
//! missed until the record is written again.

mod connectivity;
mod middleware;
mod replicator;
mod routes;

pub use connectivity::{Connectivity, ConnectivityProbe};
pub use middleware::{dual_write_layer, ReplicationState, DEFAULT_BODY_LIMIT};
pub use replicator::{apply, ErrorReporter, Mutation, MutationOp, ReplicationError, Replicator};
pub use routes::ReplicationRoutes;
