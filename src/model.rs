use crate::graph::FoodWeb;
use anyhow::Result;

/// Common interface of the network generation models.
///
/// A model owns its random stream for its whole lifetime. Every call to
/// [`Generator::generate`] consumes further draws from that stream, so
/// repeated calls yield different networks; construct a fresh seeded
/// instance to reproduce a network.
///
/// Under a valid configuration no draw or construction step fails; the
/// `Result` only propagates internal plumbing errors that cannot occur once
/// construction has validated the configuration.
pub trait Generator {
    /// Sample parameters and build a network from them.
    fn generate(&mut self) -> Result<FoodWeb>;

    /// Number of species in every generated network.
    fn n_species(&self) -> usize;
}
