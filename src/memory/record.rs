use std::borrow::Cow;

use serde::Deserialize;

/// One analyzed memory archive: the flat list of memories extracted from a
/// single source, plus the scope identifiers the upstream pipeline assigned.
#[derive(Clone, Debug, Deserialize)]
pub struct MemoryArchive {
    #[serde(rename = "sourceId")]
    pub source_id: String,
    #[serde(rename = "indexId")]
    pub index_id: String,
    pub memories: Vec<MemoryRecord>,
}

impl MemoryArchive {
    pub fn record_count(&self) -> usize {
        self.memories.len()
    }

    /// Distinct categories in first-seen record order, with member counts.
    pub fn category_counts(&self) -> Vec<(Category, usize)> {
        let mut counts: Vec<(Category, usize)> = Vec::new();
        for record in &self.memories {
            let category = record.category();
            match counts.iter_mut().find(|(existing, _)| *existing == category) {
                Some((_, count)) => *count += 1,
                None => counts.push((category, 1)),
            }
        }
        counts
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    pub sentence: String,
    #[serde(default)]
    pub embedding: Option<EmbeddingData>,
    #[serde(default)]
    pub metadata: MemoryMetadata,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

fn default_confidence() -> f32 {
    0.5
}

impl MemoryRecord {
    /// Resolved category; unknown or missing labels fall back to Description.
    pub fn category(&self) -> Category {
        self.metadata
            .category
            .as_deref()
            .and_then(Category::from_label)
            .unwrap_or(Category::Description)
    }

    /// Importance weight for layout and structural edges; records without an
    /// explicit importance fall back to their extraction confidence.
    pub fn importance(&self) -> f32 {
        self.metadata
            .importance
            .unwrap_or(self.confidence)
            .clamp(0.0, 1.0)
    }

    pub fn embedding_values(&self) -> Option<Cow<'_, [f32]>> {
        self.embedding.as_ref()?.values()
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MemoryMetadata {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub importance: Option<f32>,
}

/// Embeddings arrive either as a JSON float array or as a string encoding
/// ("[0.1, 0.2]" or "0.1, 0.2") depending on which store exported the
/// archive. Malformed values yield None rather than an error.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum EmbeddingData {
    Vector(Vec<f32>),
    Text(String),
}

impl EmbeddingData {
    pub fn values(&self) -> Option<Cow<'_, [f32]>> {
        match self {
            Self::Vector(values) => Some(Cow::Borrowed(values.as_slice())),
            Self::Text(raw) => {
                let inner = raw
                    .trim()
                    .trim_start_matches('[')
                    .trim_end_matches(']')
                    .trim();
                if inner.is_empty() {
                    return None;
                }

                let mut values = Vec::new();
                for part in inner.split(',') {
                    values.push(part.trim().parse::<f32>().ok()?);
                }
                Some(Cow::Owned(values))
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Topic,
    Entity,
    Action,
    Dialogue,
    Description,
    Emotion,
    Brand,
    Setting,
}

impl Category {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "topic" => Some(Self::Topic),
            "entity" => Some(Self::Entity),
            "action" => Some(Self::Action),
            "dialogue" => Some(Self::Dialogue),
            "description" => Some(Self::Description),
            "emotion" => Some(Self::Emotion),
            "brand" => Some(Self::Brand),
            "setting" => Some(Self::Setting),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Topic => "topic",
            Self::Entity => "entity",
            Self::Action => "action",
            Self::Dialogue => "dialogue",
            Self::Description => "description",
            Self::Emotion => "emotion",
            Self::Brand => "brand",
            Self::Setting => "setting",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_metadata(metadata: MemoryMetadata) -> MemoryRecord {
        MemoryRecord {
            id: "m-1".to_owned(),
            sentence: "a sentence".to_owned(),
            embedding: None,
            metadata,
            confidence: 0.8,
        }
    }

    #[test]
    fn unknown_category_label_falls_back_to_description() {
        let record = record_with_metadata(MemoryMetadata {
            category: Some("hologram".to_owned()),
            ..MemoryMetadata::default()
        });
        assert_eq!(record.category(), Category::Description);

        let record = record_with_metadata(MemoryMetadata::default());
        assert_eq!(record.category(), Category::Description);
    }

    #[test]
    fn category_label_roundtrip() {
        for label in [
            "topic",
            "entity",
            "action",
            "dialogue",
            "description",
            "emotion",
            "brand",
            "setting",
        ] {
            let category = Category::from_label(label).expect("known label");
            assert_eq!(category.label(), label);
        }
    }

    #[test]
    fn importance_falls_back_to_confidence() {
        let record = record_with_metadata(MemoryMetadata::default());
        assert_eq!(record.importance(), 0.8);

        let record = record_with_metadata(MemoryMetadata {
            importance: Some(0.25),
            ..MemoryMetadata::default()
        });
        assert_eq!(record.importance(), 0.25);
    }

    #[test]
    fn embedding_accepts_array_and_string_forms() {
        let vector = EmbeddingData::Vector(vec![0.5, -0.25]);
        assert_eq!(vector.values().unwrap().as_ref(), &[0.5, -0.25]);

        let bracketed = EmbeddingData::Text("[0.5, -0.25]".to_owned());
        assert_eq!(bracketed.values().unwrap().as_ref(), &[0.5, -0.25]);

        let bare = EmbeddingData::Text("0.5, -0.25".to_owned());
        assert_eq!(bare.values().unwrap().as_ref(), &[0.5, -0.25]);
    }

    #[test]
    fn malformed_embedding_string_yields_none() {
        assert!(EmbeddingData::Text("0.5, what".to_owned()).values().is_none());
        assert!(EmbeddingData::Text(String::new()).values().is_none());
        assert!(EmbeddingData::Text("[]".to_owned()).values().is_none());
    }

    #[test]
    fn category_counts_preserve_first_seen_order() {
        let archive = MemoryArchive {
            source_id: "src".to_owned(),
            index_id: "idx".to_owned(),
            memories: vec![
                record_with_metadata(MemoryMetadata {
                    category: Some("emotion".to_owned()),
                    ..MemoryMetadata::default()
                }),
                record_with_metadata(MemoryMetadata {
                    category: Some("topic".to_owned()),
                    ..MemoryMetadata::default()
                }),
                record_with_metadata(MemoryMetadata {
                    category: Some("emotion".to_owned()),
                    ..MemoryMetadata::default()
                }),
            ],
        };

        assert_eq!(
            archive.category_counts(),
            vec![(Category::Emotion, 2), (Category::Topic, 1)]
        );
    }
}
