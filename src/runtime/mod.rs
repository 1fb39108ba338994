//! # Runtime
//!
//! Process plumbing shared by the binaries.
//!
//! - `initialization`: wires feed, queue, workers and HTTP server for each controller
//! - `kubeconfig`: kubeconfig discovery and client construction
//! - `logging`: tracing subscriber setup
//! - `shutdown`: SIGINT/SIGTERM handling

pub mod initialization;
pub mod kubeconfig;
pub mod logging;
pub mod shutdown;
