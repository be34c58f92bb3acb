//! In-memory forward (prefix) index over a fixed set of record fields.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::ops::Bound;

use crate::domain::{FieldHits, IndexSchema, Record, RecordId, Value};

#[derive(Debug, Clone, Default)]
struct FieldIndex {
    postings: BTreeMap<String, BTreeSet<RecordId>>,
    tokens_by_id: HashMap<RecordId, Vec<String>>,
}

impl FieldIndex {
    fn insert(&mut self, id: RecordId, tokens: Vec<String>) {
        self.remove(id);
        if tokens.is_empty() {
            return;
        }
        for token in &tokens {
            self.postings.entry(token.clone()).or_default().insert(id);
        }
        self.tokens_by_id.insert(id, tokens);
    }

    fn remove(&mut self, id: RecordId) {
        let Some(tokens) = self.tokens_by_id.remove(&id) else {
            return;
        };
        for token in tokens {
            if let Some(ids) = self.postings.get_mut(&token) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.postings.remove(&token);
                }
            }
        }
    }

    fn ids_with_prefix(&self, prefix: &str) -> HashSet<RecordId> {
        self.postings
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(token, _)| token.starts_with(prefix))
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect()
    }

    /// Ids for which every query token prefixes at least one field token.
    fn matching(&self, query_tokens: &[String]) -> HashSet<RecordId> {
        let mut tokens = query_tokens.iter();
        let Some(first) = tokens.next() else {
            return HashSet::new();
        };
        let mut ids = self.ids_with_prefix(first);
        for token in tokens {
            if ids.is_empty() {
                break;
            }
            let next = self.ids_with_prefix(token);
            ids.retain(|id| next.contains(id));
        }
        ids
    }
}

/// A disposable projection of one collection snapshot.
///
/// Each schema field is tokenized on non-alphanumeric boundaries and
/// lowercased; a query token matches a field token it is a prefix of.
#[derive(Debug, Clone)]
pub struct DocumentIndex {
    schema: IndexSchema,
    fields: Vec<FieldIndex>,
    positions: HashMap<RecordId, usize>,
    generation: u64,
}

impl DocumentIndex {
    pub fn new(schema: IndexSchema) -> Self {
        let fields = vec![FieldIndex::default(); schema.fields().len()];
        Self {
            schema,
            fields,
            positions: HashMap::new(),
            generation: 0,
        }
    }

    pub fn from_records<'a>(
        schema: IndexSchema,
        records: impl IntoIterator<Item = &'a Record>,
    ) -> Self {
        let mut index = Self::new(schema);
        for record in records {
            index.add(record);
        }
        index
    }

    #[must_use]
    pub const fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Indexes (or re-indexes) a record under its id. Records that have not
    /// been stored yet carry no id and are skipped.
    pub fn add(&mut self, record: &Record) {
        let Some(id) = record.id else {
            return;
        };
        let next_position = self.positions.len();
        self.positions.entry(id).or_insert(next_position);

        for (field, field_index) in self.schema.fields().iter().zip(&mut self.fields) {
            let tokens = record.get(field).map(field_tokens).unwrap_or_default();
            field_index.insert(id, tokens);
        }
    }

    /// Per-field matches in schema order, ids in insertion order. At most
    /// `limit` distinct ids are returned across all groups.
    pub fn search(&self, query: &str, limit: usize) -> Vec<FieldHits> {
        let query_tokens = dedup(tokenize(query));
        if query_tokens.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut seen: HashSet<RecordId> = HashSet::new();
        let mut groups = Vec::new();

        for (field, field_index) in self.schema.fields().iter().zip(&self.fields) {
            let mut ids: Vec<RecordId> = field_index.matching(&query_tokens).into_iter().collect();
            ids.sort_by_key(|id| self.positions.get(id).copied().unwrap_or(usize::MAX));
            ids.retain(|id| seen.contains(id) || (seen.len() < limit && seen.insert(*id)));

            if !ids.is_empty() {
                groups.push(FieldHits {
                    field: field.clone(),
                    ids,
                });
            }
        }

        groups
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

fn field_tokens(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        other => dedup(tokenize(&other.to_string())),
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn dedup(tokens: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: u64, name: &str, batch: &str) -> Record {
        Record::new()
            .with_id(RecordId::new(id))
            .with_field("name", name)
            .with_field("batch", batch)
            .with_field("hsn", "3004")
            .with_field("manufacturer", "Cipla")
    }

    fn ids(hits: &[FieldHits], field: &str) -> Vec<u64> {
        hits.iter()
            .find(|h| h.field == field)
            .map(|h| h.ids.iter().map(|id| id.get()).collect())
            .unwrap_or_default()
    }

    fn sample() -> DocumentIndex {
        let records = [
            product(1, "Paracetamol 500", "PX-100"),
            product(2, "Paracetamol 650", "PX-200"),
            product(3, "Amoxicillin", "AM-7"),
        ];
        DocumentIndex::from_records(IndexSchema::products(), &records)
    }

    #[test]
    fn test_prefix_match_on_token_boundary() {
        let index = sample();
        assert_eq!(ids(&index.search("para", 100), "name"), vec![1, 2]);
        assert_eq!(ids(&index.search("650", 100), "name"), vec![2]);
        // "cetamol" is inside a token, not at its start
        assert!(index.search("cetamol", 100).is_empty());
    }

    #[test]
    fn test_hits_are_grouped_per_field() {
        let index = sample();
        let hits = index.search("px", 100);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].field, "batch");
        assert_eq!(ids(&hits, "batch"), vec![1, 2]);

        let hits = index.search("cipla", 100);
        assert_eq!(ids(&hits, "manufacturer"), vec![1, 2, 3]);
    }

    #[test]
    fn test_every_query_token_must_match_within_field() {
        let index = sample();
        assert_eq!(ids(&index.search("para 5", 100), "name"), vec![1]);
        assert!(index.search("para amox", 100).is_empty());
    }

    #[test]
    fn test_limit_caps_distinct_ids_across_fields() {
        let records: Vec<Record> = (1..=10)
            .map(|i| product(i, &format!("Item {i}"), "B1"))
            .collect();
        let index = DocumentIndex::from_records(IndexSchema::products(), &records);

        // "item" hits name for all ten; "b1" hits batch for all ten
        let hits = index.search("item", 4);
        assert_eq!(ids(&hits, "name"), vec![1, 2, 3, 4]);

        let schema = IndexSchema::new(["name", "batch"]);
        let mixed = [
            product(1, "Alpha", "Zeta"),
            product(2, "Beta", "Alpha"),
            product(3, "Gamma", "Alpha"),
        ];
        let index = DocumentIndex::from_records(schema, &mixed);
        let hits = index.search("alpha", 2);
        let distinct: HashSet<RecordId> = hits.iter().flat_map(|h| h.ids.clone()).collect();
        assert_eq!(distinct.len(), 2);
        assert_eq!(ids(&hits, "name"), vec![1]);
        assert_eq!(ids(&hits, "batch"), vec![2]);
    }

    #[test]
    fn test_readd_replaces_tokens_and_keeps_position() {
        let mut index = sample();
        index.add(&product(1, "Ibuprofen", "IB-1"));

        assert_eq!(index.len(), 3);
        assert_eq!(ids(&index.search("para", 100), "name"), vec![2]);
        assert_eq!(ids(&index.search("ibu", 100), "name"), vec![1]);

        index.add(&product(1, "Paracetamol 250", "PX-050"));
        assert_eq!(ids(&index.search("para", 100), "name"), vec![1, 2]);
    }

    #[test]
    fn test_sparse_and_unsaved_records_are_tolerated() {
        let mut index = DocumentIndex::new(IndexSchema::products());
        index.add(&Record::new().with_field("name", "No id yet"));
        index.add(&Record::new().with_id(RecordId::new(9)));
        index.add(
            &Record::new()
                .with_id(RecordId::new(10))
                .with_field("name", Value::Null)
                .with_field("hsn", 3004.0),
        );

        assert_eq!(index.len(), 2);
        assert!(index.search("no", 100).is_empty());
        assert_eq!(ids(&index.search("3004", 100), "hsn"), vec![10]);
    }

    #[test]
    fn test_blank_query_matches_nothing() {
        let index = sample();
        assert!(index.search("", 100).is_empty());
        assert!(index.search(" -- ", 100).is_empty());
        assert!(index.search("para", 0).is_empty());
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let records = [
            product(5, "Dolo 650", "D1"),
            product(3, "Dolonex", "D2"),
            product(8, "Crocin", "C1"),
        ];
        let first = DocumentIndex::from_records(IndexSchema::products(), &records);
        let second = DocumentIndex::from_records(IndexSchema::products(), &records);
        for query in ["dolo", "d", "c1", "650", "zzz"] {
            assert_eq!(first.search(query, 100), second.search(query, 100));
        }
        assert_eq!(ids(&first.search("dolo", 100), "name"), vec![5, 3]);
    }
}
