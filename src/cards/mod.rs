pub mod catalog_client;
pub mod extractor;
pub mod normalizer;
pub mod resolver;

pub use catalog_client::PokemonTcgClient;
pub use extractor::{Candidate, IdentifierExtractor};
pub use normalizer::normalize_name;
pub use resolver::{CatalogRecord, CatalogResolver, LookupProvider, ResolvedItem};
