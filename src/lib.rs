//! plantbridge: a web front-end for a PlantUML-style rendering server.
//!
//! The crate is layered top to bottom: `config` resolves deployment settings,
//! `domain` holds the diagram vocabulary and error taxonomy, `application`
//! drives the renderer's three-call protocol, and `infra` owns the HTTP
//! surface, embedded UI assets, and telemetry.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
