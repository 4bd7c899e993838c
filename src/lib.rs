//! fxbacktest: deterministic historical simulation of rule-based FX strategies.
//!
//! Hexagonal architecture: simulation core in [`domain`], port traits in
//! [`ports`], concrete collaborators (files, synthetic data, JSON) in
//! [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
