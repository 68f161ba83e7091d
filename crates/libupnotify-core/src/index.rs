use std::collections::HashMap;

use crate::types::{CanonicalRef, FileReference, Location, ReferenceGroup};

/// Deduplicates file references into canonical reference groups.
///
/// Groups come out in first-appearance order and each group keeps its
/// locations in ingestion order, never hash order, so everything rendered
/// from them is reproducible across runs over the same scan ordering.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    by_ref: HashMap<CanonicalRef, usize>,
    groups: Vec<ReferenceGroup>,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest one occurrence. The first occurrence of a canonical reference
    /// opens a new group; later ones only add their location to it.
    pub fn insert(&mut self, reference: FileReference) {
        let canonical = reference.canonical();
        let location = Location {
            filename: reference.filename,
            line: reference.line,
        };
        match self.by_ref.get(&canonical) {
            Some(&slot) => self.groups[slot].locations.push(location),
            None => {
                self.by_ref.insert(canonical.clone(), self.groups.len());
                self.groups.push(ReferenceGroup {
                    canonical,
                    locations: vec![location],
                });
            }
        }
    }

    pub fn extend<I>(&mut self, references: I)
    where
        I: IntoIterator<Item = FileReference>,
    {
        for reference in references {
            self.insert(reference);
        }
    }

    /// Number of distinct canonical references seen so far
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Consume the index, yielding groups in first-appearance order
    pub fn into_groups(self) -> Vec<ReferenceGroup> {
        self.groups
    }
}
