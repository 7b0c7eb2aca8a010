//! Indexing for Counterlens: chunking of validated pipeline output,
//! batch embedding, and namespaced vector upserts.

mod chunker;
mod embed;
mod store;

pub use chunker::{chunk_pipeline_output, generate_id};
pub use embed::{EmbeddingService, HttpEmbeddingClient, embed_chunks};
pub use store::{HttpVectorStore, VectorRecord, VectorStore};
