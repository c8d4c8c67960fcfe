/// TCP server implementation for the Army Store daemon.
///
/// This module provides the [`Router`] which handles incoming TCP connections
/// and dispatches line-protocol commands to the product service.
pub mod router;

pub use router::{dispatch, handle_connection, Reply, Router, SharedService};
