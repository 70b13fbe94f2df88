mod load;
mod record;
mod similarity;

pub use load::load_archive;
pub use record::{Category, EmbeddingData, MemoryArchive, MemoryMetadata, MemoryRecord};
pub use similarity::{
    SimilarityError, blend_similarity, combined_similarity, cosine_similarity,
    metadata_similarity, parse_timestamp, semantic_similarity, semantic_similarity_between,
};
