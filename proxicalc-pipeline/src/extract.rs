//! Windowed proximity extraction
//!
//! Walks the token sequence of one (document, field, language) text, and for
//! every numeric anchor records the tokens within `ambit` positions on either
//! side.

use crate::buffer::ProximityBuffer;
use crate::record::{Neighbor, ProximityRecord, Side};
use crate::tokenize::{is_number, parse_rounded, tokenize};
use proxicalc_core::RunCounters;
use proxicalc_elastic::DocumentHit;

/// Turns document hits into buffered proximity records.
#[derive(Debug, Clone)]
pub struct Extractor {
    source_index: String,
    ambit: usize,
}

impl Extractor {
    pub fn new(source_index: impl Into<String>, ambit: usize) -> Self {
        Self {
            source_index: source_index.into(),
            ambit,
        }
    }

    /// Process every needle field and language of one hit, appending the
    /// extracted records to the buffer and counting the document.
    pub fn process_hit(&self, hit: &DocumentHit, buffer: &ProximityBuffer, counters: &RunCounters) {
        for (field, languages) in hit.needle_fields() {
            for (language, text) in languages {
                for record in self.extract(&hit.id, field, text) {
                    buffer.add(language, record);
                }
            }
        }
        counters.record_document();
    }

    /// Extract one record per numeric anchor in `text`.
    pub fn extract(&self, doc_id: &str, field: &str, text: &str) -> Vec<ProximityRecord> {
        let tokens = tokenize(text);
        let mut records = Vec::new();

        for (i, token) in tokens.iter().enumerate() {
            if !is_number(token) {
                continue;
            }

            let left = i.saturating_sub(self.ambit);
            let right = (i + self.ambit).min(tokens.len().saturating_sub(1));

            let mut neighbors = Vec::with_capacity(right - left);
            for (j, neighbor) in tokens.iter().enumerate().take(right + 1).skip(left) {
                if j == i {
                    continue;
                }

                let (side, distance) = if j < i {
                    (Side::Before, i - j)
                } else {
                    (Side::After, j - i)
                };

                neighbors.push(Neighbor {
                    side,
                    distance,
                    text: neighbor.clone(),
                    num: is_number(neighbor).then(|| parse_rounded(neighbor)),
                });
            }

            records.push(ProximityRecord {
                source_index: self.source_index.clone(),
                source_id: doc_id.to_string(),
                source_field: field.to_string(),
                num: parse_rounded(token),
                neighbors,
            });
        }

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxicalc_elastic::DocumentSource;
    use std::collections::HashMap;

    fn neighbor_of<'a>(
        record: &'a ProximityRecord,
        side: Side,
        distance: usize,
    ) -> Option<&'a Neighbor> {
        record
            .neighbors
            .iter()
            .find(|n| n.side == side && n.distance == distance)
    }

    #[test]
    fn test_window_worked_example() {
        // tokens: ["a", "10", "b", "c", "20"], ambit 2
        let extractor = Extractor::new("patents", 2);
        let records = extractor.extract("doc", "claims_cleaned", "a 10 b c 20");

        assert_eq!(records.len(), 2);

        let anchor = &records[0];
        assert_eq!(anchor.num, 10.0);
        assert_eq!(anchor.neighbors.len(), 3);

        let before_1 = neighbor_of(anchor, Side::Before, 1).unwrap();
        assert_eq!(before_1.text, "a");
        assert_eq!(before_1.num, None);

        let after_1 = neighbor_of(anchor, Side::After, 1).unwrap();
        assert_eq!(after_1.text, "b");
        assert_eq!(after_1.num, None);

        let after_2 = neighbor_of(anchor, Side::After, 2).unwrap();
        assert_eq!(after_2.text, "c");
        assert_eq!(after_2.num, None);

        // "20" sits at distance 3, outside the window
        assert!(neighbor_of(anchor, Side::After, 3).is_none());
    }

    #[test]
    fn test_numeric_neighbors_carry_values() {
        let extractor = Extractor::new("patents", 2);
        let records = extractor.extract("doc", "claims_cleaned", "10 20");

        assert_eq!(records.len(), 2);
        let first = &records[0];
        assert_eq!(neighbor_of(first, Side::After, 1).unwrap().num, Some(20.0));
        let second = &records[1];
        assert_eq!(neighbor_of(second, Side::Before, 1).unwrap().num, Some(10.0));
    }

    #[test]
    fn test_window_never_exceeds_ambit() {
        let text = (0..40).map(|i| i.to_string()).collect::<Vec<_>>().join(" ");
        for ambit in [0usize, 1, 3, 15] {
            let extractor = Extractor::new("patents", ambit);
            for record in extractor.extract("doc", "claims_cleaned", &text) {
                for neighbor in &record.neighbors {
                    assert!(neighbor.distance >= 1);
                    assert!(neighbor.distance <= ambit);
                }
            }
        }
    }

    #[test]
    fn test_ambit_zero_yields_lone_anchors() {
        let extractor = Extractor::new("patents", 0);
        let records = extractor.extract("doc", "claims_cleaned", "a 10 b");
        assert_eq!(records.len(), 1);
        assert!(records[0].neighbors.is_empty());
    }

    #[test]
    fn test_zero_is_not_an_anchor() {
        let extractor = Extractor::new("patents", 2);
        let records = extractor.extract("doc", "claims_cleaned", "0 heated 10");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].num, 10.0);
        // but the zero token still shows up as a text neighbor
        let neighbor = neighbor_of(&records[0], Side::Before, 2).unwrap();
        assert_eq!(neighbor.text, "0");
        assert_eq!(neighbor.num, None);
    }

    #[test]
    fn test_process_hit_partitions_by_language() {
        let mut abstract_cleaned = HashMap::new();
        abstract_cleaned.insert("en".to_string(), "heated to 37.5 degrees".to_string());
        abstract_cleaned.insert("de".to_string(), "auf 40 Grad erhitzt".to_string());

        let hit = DocumentHit::new(
            "EP1",
            DocumentSource {
                abstract_cleaned: Some(abstract_cleaned),
                ..Default::default()
            },
        );

        let extractor = Extractor::new("patents", 2);
        let buffer = ProximityBuffer::new();
        let counters = RunCounters::new();
        extractor.process_hit(&hit, &buffer, &counters);

        assert_eq!(buffer.total_len(), 2);
        assert_eq!(buffer.take("en").len(), 1);
        assert_eq!(buffer.take("de").len(), 1);
        assert_eq!(counters.overall_docs(), 1);
    }
}
