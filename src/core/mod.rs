// Core algorithm exports
pub mod aggregate;
pub mod parse;
pub mod resolver;

pub use aggregate::build_distribution;
pub use parse::parse_measurement;
pub use resolver::{Resolution, ResolutionSource, SizeResolver, DEFAULT_SIZE_LABEL};
