//! Vector storage for embedded chunks.
//!
//! The pipeline persists vectors to an external collection-oriented KNN
//! store; [`qdrant`] implements that boundary over the Qdrant REST API.

pub mod qdrant;

pub use qdrant::QdrantIndex;
