//! Generation of synthetic ecological interaction networks (food webs).
//!
//! A food web is a directed graph over species `0..n_species` where an edge
//! `j -> i` records that species `i` consumes species `j`. Two generative
//! models are provided:
//!
//! - [`NicheModel`]: places every species on a one-dimensional niche axis and
//!   derives consumption from feeding intervals, repairing unconnected or
//!   trophically identical species until none remain.
//! - [`BlockModel`]: partitions species into blocks and wires edges
//!   probabilistically, with an optional hierarchical bias that makes edges
//!   flow preferentially from lower to higher block ids.
//!
//! Both models own a seedable [`random::RandomStream`]; the same seed and
//! configuration reproduce the same network bit for bit. Generated webs can
//! be written to disk as GraphML or flat node/edge/attribute files
//! ([`persist`]) and rendered with Graphviz ([`viz`]).

pub mod config;
pub mod graph;
pub mod manager;
pub mod model;
pub mod niche;
pub mod persist;
pub mod random;
pub mod sbm;
mod utils;
pub mod viz;

pub use crate::graph::{FoodWeb, Species};
pub use crate::model::Generator;
pub use crate::niche::{NicheConfig, NicheModel, NicheParams};
pub use crate::sbm::{BlockConfig, BlockModel, BlockParams};
