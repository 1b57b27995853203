//! Whole-store export and import, plus raw entry inspection.

use std::io::Write;

use anyhow::Context as _;
use serde_json::{Map, Value};

use crate::keys::StoreKey;
use crate::kv::KeyValueStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub written: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: String,
    pub kind: StoreKey,
    /// Parsed JSON when the stored text is JSON, otherwise the text itself.
    pub value: Value,
}

/// Every key of the store as one JSON object.
pub fn export(store: &dyn KeyValueStore) -> anyhow::Result<Value> {
    let mut document = Map::new();
    for entry in entries(store)? {
        document.insert(entry.key, entry.value);
    }
    Ok(Value::Object(document))
}

pub fn export_to_writer<W: Write>(store: &dyn KeyValueStore, mut writer: W) -> anyhow::Result<()> {
    let document = export(store)?;
    serde_json::to_writer_pretty(&mut writer, &document).context("serialize export")?;
    writer.write_all(b"\n").context("write export newline")?;
    writer.flush().context("flush export")?;
    Ok(())
}

/// Replaces the whole store with `document`, which must be a JSON object.
///
/// String values are stored verbatim, anything else as its JSON text. A key
/// that fails to write is logged and counted; the import carries on.
pub fn import(store: &dyn KeyValueStore, document: &Value) -> anyhow::Result<ImportSummary> {
    let Value::Object(entries) = document else {
        anyhow::bail!("import document must be a JSON object");
    };

    store.clear().context("clear store before import")?;

    let mut summary = ImportSummary::default();
    for (key, value) in entries {
        let raw = match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        match store.set(key, &raw) {
            Ok(()) => summary.written += 1,
            Err(err) => {
                tracing::warn!(key, ?err, "failed to import entry");
                summary.failed += 1;
            }
        }
    }

    tracing::info!(written = summary.written, failed = summary.failed, "import finished");
    Ok(summary)
}

pub fn import_from_str(store: &dyn KeyValueStore, json: &str) -> anyhow::Result<ImportSummary> {
    let document: Value = serde_json::from_str(json).context("parse import document")?;
    import(store, &document)
}

pub fn entries(store: &dyn KeyValueStore) -> anyhow::Result<Vec<Entry>> {
    let mut out = Vec::new();
    for key in store.keys().context("list store keys")? {
        let Some(raw) = store.get(&key).with_context(|| format!("read key: {key}"))? else {
            continue;
        };
        let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
        out.push(Entry {
            kind: StoreKey::parse(&key),
            key,
            value,
        });
    }
    Ok(out)
}

/// Returns whether the key existed.
pub fn remove_entry(store: &dyn KeyValueStore, key: &str) -> anyhow::Result<bool> {
    let existed = store.get(key)?.is_some();
    if existed {
        store.remove(key).with_context(|| format!("remove key: {key}"))?;
    }
    Ok(existed)
}
