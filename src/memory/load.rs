use std::fs;

use anyhow::{Context, Result, anyhow};

use super::record::MemoryArchive;

pub fn load_archive(path: &str) -> Result<MemoryArchive> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read memory archive at {path}"))?;
    parse_archive(&raw).with_context(|| format!("failed to parse memory archive at {path}"))
}

fn parse_archive(raw: &str) -> Result<MemoryArchive> {
    let mut archive: MemoryArchive =
        serde_json::from_str(raw).context("invalid JSON in memory archive")?;

    archive.memories.retain(|memory| !memory.id.is_empty());
    if archive.memories.is_empty() {
        return Err(anyhow!("memory archive contains no usable memories"));
    }

    Ok(archive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Category;

    #[test]
    fn parses_a_minimal_archive() {
        let raw = r#"{
            "sourceId": "rec-42",
            "indexId": "idx-7",
            "memories": [
                {
                    "id": "m-1",
                    "sentence": "A drone hovers over the harbor.",
                    "embedding": [0.1, 0.2, 0.3],
                    "metadata": { "category": "setting", "timestamp": "1:12" },
                    "confidence": 0.9
                }
            ]
        }"#;

        let archive = parse_archive(raw).expect("valid archive");
        assert_eq!(archive.source_id, "rec-42");
        assert_eq!(archive.index_id, "idx-7");
        assert_eq!(archive.record_count(), 1);
        assert_eq!(archive.memories[0].category(), Category::Setting);
    }

    #[test]
    fn tolerates_string_embeddings_and_sparse_metadata() {
        let raw = r#"{
            "sourceId": "rec",
            "indexId": "idx",
            "memories": [
                { "id": "m-1", "sentence": "first", "embedding": "[0.5, 0.5]" },
                { "id": "m-2", "sentence": "second", "metadata": { "category": "unheard-of" } }
            ]
        }"#;

        let archive = parse_archive(raw).expect("valid archive");
        assert_eq!(
            archive.memories[0].embedding_values().unwrap().as_ref(),
            &[0.5, 0.5]
        );
        assert!(archive.memories[1].embedding_values().is_none());
        assert_eq!(archive.memories[1].category(), Category::Description);
        assert_eq!(archive.memories[1].confidence, 0.5);
    }

    #[test]
    fn rejects_archives_without_memories() {
        let raw = r#"{ "sourceId": "rec", "indexId": "idx", "memories": [] }"#;
        assert!(parse_archive(raw).is_err());

        let raw = r#"{ "sourceId": "rec", "indexId": "idx", "memories": [
            { "id": "", "sentence": "orphaned" }
        ] }"#;
        assert!(parse_archive(raw).is_err());
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(parse_archive("not json at all").is_err());
    }
}
