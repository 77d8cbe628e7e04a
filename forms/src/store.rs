use crate::dirty::DirtyTracker;
use fields::{ErrorRecord, FieldSchema, Record};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Values and errors of a form at one point in time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormSnapshot {
    pub values: Record,
    pub errors: ErrorRecord,
}

impl FormSnapshot {
    pub fn new(values: Record, errors: ErrorRecord) -> Self {
        Self { values, errors }
    }
}

/// Value and error store of one form instance
///
/// Mutations are synchronous and never run validation. Every mutation bumps
/// a version counter that consumers can watch through [`FormStore::subscribe`]
/// instead of re-reading the whole form.
#[derive(Debug)]
pub struct FormStore {
    schema: Arc<FieldSchema>,
    values: Record,
    errors: ErrorRecord,
    dirty: DirtyTracker,
    version: watch::Sender<u64>,
}

impl FormStore {
    pub fn new(schema: Arc<FieldSchema>, snapshot: FormSnapshot) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            schema,
            values: snapshot.values,
            errors: snapshot.errors,
            dirty: DirtyTracker::new(),
            version,
        }
    }

    /// Current value record
    pub fn get(&self) -> &Record {
        &self.values
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Write a field value and mark the form dirty
    ///
    /// A select field's change hook runs synchronously and its patch is
    /// merged into the record after the value is written.
    pub fn set(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);

        if let Some(hook) = self.schema.field(name).and_then(|f| f.change_hook()) {
            let current = self.values.get(name).cloned().unwrap_or(Value::Null);
            let patch = hook.apply(&current, &self.values);
            debug!("Change hook of '{}' patched {} fields", name, patch.len());
            for (key, patched) in patch {
                self.values.insert(key, patched);
            }
        }

        self.dirty.mark();
        self.bump();
    }

    /// Error message of a field, empty when valid
    pub fn error(&self, name: &str) -> &str {
        self.errors.get(name)
    }

    pub fn errors(&self) -> &ErrorRecord {
        &self.errors
    }

    pub fn set_error(&mut self, name: &str, message: impl Into<String>) {
        self.errors.set(name, message);
        self.bump();
    }

    /// Replace the whole error record
    pub fn set_errors(&mut self, errors: ErrorRecord) {
        self.errors = errors;
        self.bump();
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.is_dirty()
    }

    /// Restore values and errors from a snapshot and clear dirty
    pub fn reset(&mut self, snapshot: &FormSnapshot) {
        self.values = snapshot.values.clone();
        self.errors = snapshot.errors.clone();
        self.dirty.clear();
        self.bump();
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot::new(self.values.clone(), self.errors.clone())
    }

    /// Watch the mutation counter
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    fn bump(&self) {
        self.version.send_modify(|version| *version += 1);
    }
}
