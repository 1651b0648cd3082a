//! votable-ingest - validates VOTABLE tables against declarative constraints
//! and derives the statements that load them into a relational store
//!
//! Layers, bottom-up:
//! - `votable`: the parsed table model and typed values
//! - `constraint`: the constraint catalog
//! - `matcher`: matching declared elements to constraints, cell conversion
//! - `traversal`: the ordered walk over a table, fail-fast or accumulating
//! - `ddl`: statement rendering
//! - `ingest`: the execution-mode controller
//! - `pipelines`: collection catalogue and validation metric ingestion

pub mod cli;
pub mod config;
pub mod constraint;
pub mod ddl;
pub mod ingest;
pub mod matcher;
pub mod observability;
pub mod pipelines;
pub mod repository;
pub mod traversal;
pub mod votable;
