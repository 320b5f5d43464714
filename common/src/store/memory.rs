//! In-memory ledger store

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use crate::decimal::{from_store_value, to_store_value, Amount};
use crate::error::{Error, Result};
use crate::store::LedgerStore;

/// In-memory store backed by a concurrent map.
///
/// Conditional primitives run under the shard lock taken by the entry API,
/// which makes each of them atomic with respect to every other writer in
/// the process.
pub struct InMemoryLedgerStore {
    /// Entries by key
    pub entries: DashMap<String, String>,
}

impl InMemoryLedgerStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn insert_if_absent(&self, key: &str, value: &str) -> Result<bool> {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(vacant) => {
                vacant.insert(value.to_string());
                Ok(true)
            }
        }
    }

    async fn increment(&self, key: &str, delta: Amount) -> Result<Amount> {
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| to_store_value(Amount::ZERO));

        let current = from_store_value(entry.value())?;
        let next = current
            .checked_add(delta)
            .ok_or_else(|| Error::DecimalError(format!("Overflow adding {} to {}", delta, key)))?;

        *entry.value_mut() = to_store_value(next);
        debug!("Incremented {} by {} to {}", key, delta, next);
        Ok(next)
    }

    async fn decrement_if_sufficient(&self, key: &str, amount: Amount) -> Result<Option<Amount>> {
        if amount.is_sign_negative() {
            return Err(Error::ValidationError(format!("Cannot decrement by negative amount {}", amount)));
        }

        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let current = from_store_value(occupied.get())?;
                if current < amount {
                    debug!("Refused to decrement {} by {}: holds {}", key, amount, current);
                    return Ok(None);
                }

                let next = current - amount;
                occupied.insert(to_store_value(next));
                debug!("Decremented {} by {} to {}", key, amount, next);
                Ok(Some(next))
            }
            Entry::Vacant(_) if amount.is_zero() => Ok(Some(Amount::ZERO)),
            Entry::Vacant(_) => Ok(None),
        }
    }

    async fn delete_if_equals(&self, key: &str, expected: &str) -> Result<bool> {
        Ok(self.entries.remove_if(key, |_, value| value == expected).is_some())
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        let mut entries: Vec<(String, String)> = self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
