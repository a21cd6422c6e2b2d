#![deny(warnings)]
#![deny(rust_2018_idioms)]

//! Consumes the upstream push channel of named vessel events, decodes every payload into a
//! typed update batch and feeds the coalesced batches to a [fleet_state::VesselStore].

pub mod consumer;
pub mod decoder;
pub mod error;
pub mod models;
pub mod settings;
pub mod startup;
