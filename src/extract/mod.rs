pub mod commodities;
pub mod dates;
pub mod header;
pub mod locations;
pub mod merge;
pub mod notes;
pub mod patterns;
pub mod pipeline;
pub mod rates;
pub mod tables;
#[cfg(test)]
mod tests;

pub use pipeline::{AiOutcome, DocumentInput, DocumentSource, TariffPipeline};
