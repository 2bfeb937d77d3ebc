//! In-memory index of a previous release snapshot.

use std::collections::BTreeMap;
use std::io::{BufRead, Write};

use serde::Serialize;

use crate::canonical::canonical_hash_hex;
use crate::types::SctId;
use super::codec::{self, FormatError};
use super::datum::HistoricDatum;

/// Error type for snapshot file I/O.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Malformed line.
    #[error(transparent)]
    Format(#[from] FormatError),
    /// Underlying reader or writer failed.
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The same concept appeared on two lines.
    #[error("line {line}: concept {concept_id} already present")]
    DuplicateConcept {
        /// 1-based line number of the second occurrence.
        line: usize,
        /// Repeated concept.
        concept_id: SctId,
    },
}

/// `concept id → HistoricDatum`, immutable once built.
///
/// Uses BTreeMap for deterministic iteration and output order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotIndex {
    data: BTreeMap<SctId, HistoricDatum>,
}

impl SnapshotIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a snapshot file line by line.
    ///
    /// The first malformed line aborts the load; no partial index is returned.
    pub fn load<R: BufRead>(mut reader: R) -> Result<Self, SnapshotError> {
        let mut data = BTreeMap::new();
        let mut buf = Vec::new();
        let mut line_no = 0;
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            line_no += 1;

            let bytes = strip_line_ending(&buf);
            let line = std::str::from_utf8(bytes).map_err(|_| FormatError::InvalidEncoding {
                line: line_no,
                raw: String::from_utf8_lossy(bytes).into_owned(),
            })?;
            let datum = codec::decode(line_no, line)?;
            let concept_id = datum.concept_id;
            if data.insert(concept_id, datum).is_some() {
                return Err(SnapshotError::DuplicateConcept {
                    line: line_no,
                    concept_id,
                });
            }
        }

        tracing::info!(concepts = data.len(), "historic snapshot loaded");
        Ok(Self { data })
    }

    /// Encode every record, one line each, ordered by concept id.
    pub fn write<W: Write>(&self, mut writer: W) -> Result<(), SnapshotError> {
        for datum in self.data.values() {
            let line = codec::encode(datum)?;
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        tracing::info!(concepts = self.data.len(), "historic snapshot written");
        Ok(())
    }

    /// Look up a concept.
    pub fn get(&self, concept_id: SctId) -> Option<&HistoricDatum> {
        self.data.get(&concept_id)
    }

    /// Whether the concept is present.
    pub fn contains(&self, concept_id: SctId) -> bool {
        self.data.contains_key(&concept_id)
    }

    /// All records ordered by concept id.
    pub fn iter(&self) -> impl Iterator<Item = &HistoricDatum> {
        self.data.values()
    }

    /// Number of concepts.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Content fingerprint over every record (xxh64 of the canonical JSON).
    pub fn fingerprint(&self) -> String {
        #[derive(Serialize)]
        struct Fingerprint<'a> {
            concepts: usize,
            records: Vec<&'a HistoricDatum>,
        }
        canonical_hash_hex(&Fingerprint {
            concepts: self.data.len(),
            records: self.data.values().collect(),
        })
    }
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

impl FromIterator<HistoricDatum> for SnapshotIndex {
    fn from_iter<I: IntoIterator<Item = HistoricDatum>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().map(|d| (d.concept_id, d)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Component, ComponentId};
    use std::io::Cursor;

    fn datum(id: u64) -> HistoricDatum {
        let module = SctId::new(900000000000207008);
        let mut d = HistoricDatum::new(SctId::new(id), format!("Concept {id} (finding)"), module);
        d.record(&Component::description(
            ComponentId::new(format!("{id}011")).unwrap(),
            SctId::new(id),
            module,
            "en",
            false,
        ));
        d
    }

    #[test]
    fn test_write_then_load() {
        let index: SnapshotIndex = [datum(3), datum(1), datum(2)].into_iter().collect();
        let mut buf = Vec::new();
        index.write(&mut buf).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.starts_with("1\t"));

        let loaded = SnapshotIndex::load(Cursor::new(buf)).unwrap();
        assert_eq!(loaded, index);
        assert_eq!(loaded.fingerprint(), index.fingerprint());
    }

    #[test]
    fn test_malformed_line_aborts_load() {
        let index: SnapshotIndex = [datum(1)].into_iter().collect();
        let mut buf = Vec::new();
        index.write(&mut buf).unwrap();
        buf.extend_from_slice(b"2\tshort line\n");

        match SnapshotIndex::load(Cursor::new(buf)) {
            Err(SnapshotError::Format(FormatError::ColumnCount { line, found, .. })) => {
                assert_eq!(line, 2);
                assert_eq!(found, 2);
            }
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn test_crlf_line_endings_load() {
        let line = codec::encode(&datum(1)).unwrap();
        let loaded = SnapshotIndex::load(Cursor::new(format!("{line}\r\n"))).unwrap();
        let expected: SnapshotIndex = [datum(1)].into_iter().collect();
        assert_eq!(loaded, expected);
    }

    #[test]
    fn test_duplicate_concept_rejected() {
        let line = codec::encode(&datum(1)).unwrap();
        let text = format!("{line}\n{line}\n");
        assert!(matches!(
            SnapshotIndex::load(Cursor::new(text)),
            Err(SnapshotError::DuplicateConcept { line: 2, .. })
        ));
    }

    #[test]
    fn test_fingerprint_changes_with_content() {
        let a: SnapshotIndex = [datum(1)].into_iter().collect();
        let mut changed = datum(1);
        changed.active = false;
        let b: SnapshotIndex = [changed].into_iter().collect();
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
