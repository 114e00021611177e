//! Database loading - JSON source to the validated dialogue graph
//!
//! The database is authored externally and loaded once before any session
//! opens. Reference validation runs here so dangling node ids become load
//! errors instead of mid-conversation dead ends.

use crate::domain::entities::DialogueDatabase;
use crate::domain::errors::DomainError;
use thiserror::Error;

/// Errors surfaced while turning authored JSON into a usable database
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Malformed dialogue database: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] DomainError),
}

/// Parse and validate a dialogue database from its JSON source
pub fn parse_database(source: &str) -> Result<DialogueDatabase, LoadError> {
    let database: DialogueDatabase = serde_json::from_str(source)?;
    database.validate()?;

    log::info!(
        "[Loader] Dialogue database loaded: {} characters, digest {}",
        database.characters.len(),
        source_digest(source)
    );
    Ok(database)
}

/// Content digest of the raw source, for correlating logs and saves with a
/// database revision
pub fn source_digest(source: &str) -> String {
    format!("{:x}", md5::compute(source.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::NodeId;

    const MINIMAL: &str = r#"{
        "characters": [
            {
                "character_id": "Garson",
                "display_name": "Garson",
                "nodes": [
                    {
                        "node_id": "ch1_entry",
                        "lines": [
                            { "speaker": "Garson", "text": "Good evening." }
                        ],
                        "next_node_id": "ch1_more"
                    },
                    { "node_id": "ch1_more" }
                ]
            }
        ]
    }"#;

    #[test]
    fn parses_minimal_database() {
        let database = parse_database(MINIMAL).unwrap();
        let garson = database.character(&"Garson".into()).unwrap();
        assert_eq!(garson.nodes.len(), 2);

        let entry = garson.node(&NodeId::from("ch1_entry")).unwrap();
        assert_eq!(entry.minimum_chapter, 1);
        assert_eq!(entry.lines[0].typing_speed, 0.0);
    }

    #[test]
    fn rejects_dangling_reference() {
        let source = r#"{
            "characters": [
                {
                    "character_id": "Garson",
                    "display_name": "Garson",
                    "nodes": [
                        { "node_id": "ch1_entry", "next_node_id": "ch1_gone" }
                    ]
                }
            ]
        }"#;
        assert!(matches!(
            parse_database(source),
            Err(LoadError::Invalid(DomainError::DanglingReference { .. }))
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            parse_database("not json"),
            Err(LoadError::Malformed(_))
        ));
    }

    #[test]
    fn digest_is_stable_and_content_sensitive() {
        assert_eq!(source_digest(MINIMAL), source_digest(MINIMAL));
        assert_ne!(source_digest(MINIMAL), source_digest("{}"));
    }
}
