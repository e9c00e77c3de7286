//! Reclink Worker Library
//!
//! Background worker that advances record-linkage jobs through their
//! pipeline: validating candidate records against a job's source record
//! with a configurable filter chain, merging the edit sets the filters
//! request, and forwarding the surviving link data to the batch-import
//! service.
//!
//! # Architecture
//!
//! - **config**: environment-based worker configuration
//! - **store**: job document store contract and backends
//! - **queue**: per-job stage queues, batch lifecycle and the queue pump
//! - **validate**: filter compilation, record selection and the validation
//!   stage
//! - **merge**: collapses link data that targets structurally identical
//!   records
//! - **import**: batch-import client and the import stage
//! - **scheduler**: the priority scan loop dispatching jobs to the stages
//!
//! Jobs live in the document store; the scheduler is the only writer of
//! their `state`. Candidate records and pending link data flow through
//! per-job queues named `"<state>.<job_id>"`.

pub mod config;
pub mod import;
pub mod merge;
pub mod queue;
pub mod scheduler;
pub mod store;
pub mod validate;

pub use config::Config;
pub use scheduler::Scheduler;
