use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A stored value and the epoch second after which it is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub value: String,
    #[serde(rename = "expire_time", with = "expire_time")]
    pub expires_at: Option<u64>,
}

impl Entry {
    /// Builds an entry set at `now` with the given TTL. A TTL of zero or less never expires.
    pub fn with_ttl(value: impl Into<String>, ttl: i64, now: u64) -> Self {
        let expires_at = (ttl > 0).then(|| now.saturating_add(ttl as u64));
        Self {
            value: value.into(),
            expires_at,
        }
    }

    pub fn persistent(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            expires_at: None,
        }
    }

    pub fn is_expired(&self, now: u64) -> bool {
        self.expires_at.map_or(false, |expires_at| now > expires_at)
    }
}

/// `0` on the wire means no expiration.
mod expire_time {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<u64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.unwrap_or(0))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u64>, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok((secs != 0).then_some(secs))
    }
}

/// Outcome of a read against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Value(String),
    Expired,
    NotFound,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Store {
    data: BTreeMap<String, Entry>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw access, without any expiration check.
    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.data.get(key)
    }

    pub fn insert(&mut self, key: String, entry: Entry) -> Option<Entry> {
        self.data.insert(key, entry)
    }

    pub fn remove(&mut self, key: &str) -> Option<Entry> {
        self.data.remove(key)
    }

    /// Reads a key, evicting it if its expiration has passed.
    pub fn get(&mut self, key: &str, now: u64) -> Lookup {
        match self.data.get(key) {
            None => Lookup::NotFound,
            Some(entry) if entry.is_expired(now) => {
                self.data.remove(key);
                Lookup::Expired
            }
            Some(entry) => Lookup::Value(entry.value.clone()),
        }
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn sweep_expired(&mut self, now: u64) -> usize {
        let before = self.data.len();
        self.data.retain(|_, entry| !entry.is_expired(now));
        before - self.data.len()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Entry)> {
        self.data.iter()
    }
}
