pub mod indexer;
pub mod inverted;
pub mod posting;
