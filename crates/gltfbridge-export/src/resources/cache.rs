//! Typed handles, asset arenas and keyed get-or-insert caches

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use serde::{Serialize, Serializer};

/// Index of an asset in its [`Arena`].
///
/// Handles are only ever created by the arena that owns the asset, so two
/// handles compare equal exactly when they refer to the same asset instance.
pub struct Handle<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn new(index: u32) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    /// Position of the asset in its table
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = std::any::type_name::<T>();
        let short = name.rsplit("::").next().unwrap_or(name);
        write!(f, "Handle<{short}>({})", self.index)
    }
}

impl<T> Serialize for Handle<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.index)
    }
}

/// Append-only storage owning every asset of one kind
#[derive(Debug)]
pub struct Arena<T> {
    items: Vec<T>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, item: T) -> Handle<T> {
        let handle = Handle::new(self.items.len() as u32);
        self.items.push(item);
        handle
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.items.get(handle.index())
    }

    /// Assets in creation order
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(index, item)| (Handle::new(index as u32), item))
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Result of a keyed lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup<V> {
    pub value: V,
    /// `true` when the value was already cached and no factory ran
    pub hit: bool,
}

/// Map from an asset key to the cached value for that key.
///
/// Every lookup is a single entry operation: the factory runs only when the
/// key is vacant and its result is stored before the call returns. Nothing
/// is ever evicted.
#[derive(Debug)]
pub struct KeyedCache<K, V> {
    entries: HashMap<K, V>,
}

impl<K, V> Default for KeyedCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V: Copy> KeyedCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_insert_with(&mut self, key: K, factory: impl FnOnce() -> V) -> Lookup<V> {
        match self.entries.entry(key) {
            Entry::Occupied(entry) => Lookup {
                value: *entry.get(),
                hit: true,
            },
            Entry::Vacant(entry) => Lookup {
                value: *entry.insert(factory()),
                hit: false,
            },
        }
    }

    /// Like [`get_or_insert_with`](Self::get_or_insert_with), but a failing
    /// factory leaves the key vacant.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: K,
        factory: impl FnOnce() -> Result<V, E>,
    ) -> Result<Lookup<V>, E> {
        match self.entries.entry(key) {
            Entry::Occupied(entry) => Ok(Lookup {
                value: *entry.get(),
                hit: true,
            }),
            Entry::Vacant(entry) => Ok(Lookup {
                value: *entry.insert(factory()?),
                hit: false,
            }),
        }
    }

    pub fn peek(&self, key: &K) -> Option<V> {
        self.entries.get(key).copied()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
