use anyhow::Result;
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};
use dachstaler_types::{Key, KeyGroup, Username, Value, WeekId};
use std::future::Future;

#[cfg(any(test, feature = "mocks"))]
use std::collections::BTreeMap;
#[cfg(any(test, feature = "mocks"))]
use std::sync::atomic::{AtomicU64, Ordering};

/// Read/write contract against the primary store: point get/put/delete plus
/// list-by-prefix, eventually consistent, no multi-key transactions.
pub trait State {
    fn get(&self, key: &Key) -> impl Future<Output = Result<Option<Value>>>;
    fn insert(&mut self, key: Key, value: Value) -> impl Future<Output = Result<()>>;
    fn delete(&mut self, key: &Key) -> impl Future<Output = Result<()>>;
    fn scan(&self, group: KeyGroup) -> impl Future<Output = Result<Vec<(Key, Value)>>>;

    fn apply(&mut self, changes: Vec<(Key, Status)>) -> impl Future<Output = Result<()>> {
        async {
            for (key, status) in changes {
                match status {
                    Status::Update(value) => self.insert(key, value).await?,
                    Status::Delete => self.delete(&key).await?,
                }
            }
            Ok(())
        }
    }
}

/// A staged mutation of one key.
#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::large_enum_variant)]
pub enum Status {
    Update(Value),
    Delete,
}

impl Write for Status {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Status::Update(value) => {
                0u8.write(writer);
                value.write(writer);
            }
            Status::Delete => 1u8.write(writer),
        }
    }
}

impl Read for Status {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(Status::Update(Value::read(reader)?)),
            1 => Ok(Status::Delete),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for Status {
    fn encode_size(&self) -> usize {
        1 + match self {
            Status::Update(value) => value.encode_size(),
            Status::Delete => 0,
        }
    }
}

/// Result of a non-critical read. Storage failure on such a read is absorbed
/// into a safe default, but the caller sees which one it got, so the
/// default-vs-abort decision is explicit at every call site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadFallback<T> {
    Loaded(T),
    Defaulted(T),
}

impl<T> ReadFallback<T> {
    pub fn into_inner(self) -> T {
        match self {
            ReadFallback::Loaded(value) | ReadFallback::Defaulted(value) => value,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, ReadFallback::Defaulted(_))
    }
}

/// A durability-critical row mirrored to the secondary relational store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MirrorRow {
    PurchaseCount {
        player: Username,
        item: String,
        week: WeekId,
        count: u32,
    },
    StreakSnapshot {
        player: Username,
        wins: u32,
        losses: u32,
    },
    PaidItem {
        player: Username,
        item: String,
    },
}

/// Secondary relational store with row-level atomic upsert. Mirroring is
/// best-effort: a failed upsert never fails the primary write, it is reported
/// in the commit receipt for reconciliation.
pub trait Mirror {
    fn upsert(&mut self, row: &MirrorRow) -> impl Future<Output = Result<()>>;
}

/// Mirror that drops every row, for callers without a secondary store.
#[derive(Default)]
pub struct NullMirror;

impl Mirror for NullMirror {
    async fn upsert(&mut self, _row: &MirrorRow) -> Result<()> {
        Ok(())
    }
}

#[cfg(any(test, feature = "mocks"))]
#[derive(Default)]
pub struct Memory {
    state: BTreeMap<Key, Value>,
}

#[cfg(any(test, feature = "mocks"))]
impl State for Memory {
    async fn get(&self, key: &Key) -> Result<Option<Value>> {
        Ok(self.state.get(key).cloned())
    }

    async fn insert(&mut self, key: Key, value: Value) -> Result<()> {
        self.state.insert(key, value);
        Ok(())
    }

    async fn delete(&mut self, key: &Key) -> Result<()> {
        self.state.remove(key);
        Ok(())
    }

    async fn scan(&self, group: KeyGroup) -> Result<Vec<(Key, Value)>> {
        Ok(self
            .state
            .iter()
            .filter(|(key, _)| key.group() == group)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}

/// Wrapper that fails every read touching one of the poisoned key groups,
/// for exercising the storage-unavailable paths.
#[cfg(any(test, feature = "mocks"))]
pub struct Flaky<S> {
    pub inner: S,
    pub poisoned: Vec<KeyGroup>,
    pub failures: AtomicU64,
}

#[cfg(any(test, feature = "mocks"))]
impl<S> Flaky<S> {
    pub fn new(inner: S, poisoned: Vec<KeyGroup>) -> Self {
        Self {
            inner,
            poisoned,
            failures: AtomicU64::new(0),
        }
    }

    fn check(&self, group: KeyGroup) -> Result<()> {
        if self.poisoned.contains(&group) {
            self.failures.fetch_add(1, Ordering::Relaxed);
            anyhow::bail!("injected storage failure for {group:?}");
        }
        Ok(())
    }
}

#[cfg(any(test, feature = "mocks"))]
impl<S: State> State for Flaky<S> {
    async fn get(&self, key: &Key) -> Result<Option<Value>> {
        self.check(key.group())?;
        self.inner.get(key).await
    }

    async fn insert(&mut self, key: Key, value: Value) -> Result<()> {
        self.check(key.group())?;
        self.inner.insert(key, value).await
    }

    async fn delete(&mut self, key: &Key) -> Result<()> {
        self.check(key.group())?;
        self.inner.delete(key).await
    }

    async fn scan(&self, group: KeyGroup) -> Result<Vec<(Key, Value)>> {
        self.check(group)?;
        self.inner.scan(group).await
    }
}

/// Recording mirror for tests; optionally fails every upsert.
#[cfg(any(test, feature = "mocks"))]
#[derive(Default)]
pub struct MemoryMirror {
    pub rows: Vec<MirrorRow>,
    pub failing: bool,
}

#[cfg(any(test, feature = "mocks"))]
impl Mirror for MemoryMirror {
    async fn upsert(&mut self, row: &MirrorRow) -> Result<()> {
        if self.failing {
            anyhow::bail!("injected mirror failure");
        }
        self.rows.push(row.clone());
        Ok(())
    }
}
