use crate::record::{Record, Value};

type Hook = Box<dyn FnMut(&Record)>;

/// Owner of a table's records.
///
/// Record lifecycle lives here; the view engine only ever reads
/// [`RecordStore::records`]. Listeners that need to know about inserts or
/// deletes register once through [`RecordStore::on_add`] and
/// [`RecordStore::on_delete`].
#[derive(Default)]
pub struct RecordStore {
    records: Vec<Record>,
    add_hooks: Vec<Hook>,
    delete_hooks: Vec<Hook>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an initial set of records. No hooks fire for them.
    pub fn from_records(records: Vec<Record>) -> Self {
        RecordStore {
            records,
            ..Self::default()
        }
    }

    pub fn on_add(&mut self, hook: impl FnMut(&Record) + 'static) {
        self.add_hooks.push(Box::new(hook));
    }

    pub fn on_delete(&mut self, hook: impl FnMut(&Record) + 'static) {
        self.delete_hooks.push(Box::new(hook));
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Appends `record` and notifies add hooks. A record whose id is already
    /// present replaces the old one in place and is not reported as added.
    pub fn insert(&mut self, record: Record) {
        if let Some(pos) = self.records.iter().position(|r| r.id == record.id) {
            self.records[pos] = record;
            return;
        }
        for hook in &mut self.add_hooks {
            hook(&record);
        }
        self.records.push(record);
    }

    pub fn update(&mut self, id: &str, field: &str, value: Value) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.set(field, value);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Record> {
        let pos = self.records.iter().position(|r| r.id == id)?;
        let removed = self.records.remove(pos);
        for hook in &mut self.delete_hooks {
            hook(&removed);
        }
        Some(removed)
    }
}
