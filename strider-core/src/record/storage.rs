//! Aggregation of stored records.
use super::{Record, RecordValue};
use std::collections::BTreeSet;

/// Stores records and aggregates them.
///
/// Scalars are reduced to their mean. For keys that appear in only some of
/// the records, the mean is taken over those records. Other values keep their
/// most recent occurrence.
#[derive(Debug, Default)]
pub struct RecordStorage {
    data: Vec<Record>,
}

impl RecordStorage {
    /// Constructs an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a record.
    pub fn store(&mut self, record: Record) {
        self.data.push(record);
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Aggregates the stored records and clears the storage.
    pub fn aggregate(&mut self) -> Record {
        let keys = self
            .data
            .iter()
            .flat_map(|r| r.keys().cloned())
            .collect::<BTreeSet<_>>();
        let mut out = Record::empty();

        for key in keys {
            let scalars = self
                .data
                .iter()
                .filter_map(|r| match r.get(&key) {
                    Some(RecordValue::Scalar(v)) => Some(*v),
                    _ => None,
                })
                .collect::<Vec<_>>();

            if scalars.is_empty() {
                if let Some(v) = self.data.iter().rev().find_map(|r| r.get(&key)) {
                    out.insert(key, v.clone());
                }
            } else {
                let mean = scalars.iter().sum::<f32>() / scalars.len() as f32;
                out.insert(key, RecordValue::Scalar(mean));
            }
        }

        self.data.clear();
        out
    }
}
