//! Associative containers under reverse-mode AD.
//!
//! The tangent of a keyed container is itself a map holding only the keys the
//! backward pass touched. An absent key is an implicit zero. Reading one key
//! therefore contributes a single-entry map instead of a zero per primal key.
//!
//! [`KeyedAccessor`] mirrors [`crate::Accessor`] with keys in place of
//! positions: `stage` copies an entry into a staged register and `commit`
//! writes one back.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use num_traits::Zero;

use crate::differentiable::{Differentiable, TangentVector};
use crate::error::{Error, Result};
use crate::option::OptionTangent;

/// Tangent of a keyed container: touched keys only.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(
        serialize = "K: serde::Serialize + Eq + Hash, T: serde::Serialize",
        deserialize = "K: serde::Deserialize<'de> + Eq + Hash, T: serde::Deserialize<'de>"
    ))
)]
pub struct KeyedTangent<K, T> {
    pub(crate) entries: HashMap<K, T>,
}

impl<K, T> KeyedTangent<K, T> {
    #[inline]
    pub fn new() -> Self {
        KeyedTangent {
            entries: HashMap::new(),
        }
    }

    /// Number of stored keys. Not the primal's key count.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn as_map(&self) -> &HashMap<K, T> {
        &self.entries
    }

    #[inline]
    pub fn into_map(self) -> HashMap<K, T> {
        self.entries
    }
}

impl<K, T> Default for KeyedTangent<K, T> {
    fn default() -> Self {
        KeyedTangent::new()
    }
}

impl<K: Eq + Hash, T: PartialEq> PartialEq for KeyedTangent<K, T> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K, T> From<HashMap<K, T>> for KeyedTangent<K, T> {
    fn from(entries: HashMap<K, T>) -> Self {
        KeyedTangent { entries }
    }
}

impl<K: Eq + Hash, T> FromIterator<(K, T)> for KeyedTangent<K, T> {
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        KeyedTangent {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<K: Eq + Hash, T: TangentVector> KeyedTangent<K, T> {
    /// Tangent for `key`, zero when absent.
    pub fn get(&self, key: &K) -> T {
        self.entries.get(key).cloned().unwrap_or_else(T::zero)
    }

    /// Add `d` to the entry for `key`, inserting it if absent.
    pub fn accumulate(&mut self, key: K, d: T) {
        match self.entries.entry(key) {
            Entry::Occupied(mut slot) => {
                let current = std::mem::replace(slot.get_mut(), T::zero());
                *slot.get_mut() = current + d;
            }
            Entry::Vacant(slot) => {
                slot.insert(d);
            }
        }
    }

    /// Move the entry for `key` out. Absent keys yield zero.
    pub fn take(&mut self, key: &K) -> T {
        self.entries.remove(key).unwrap_or_else(T::zero)
    }

    /// Drop entries that are zero. The represented value is unchanged.
    pub fn collapse(&mut self) {
        self.entries.retain(|_, d| !d.is_zero());
    }
}

/// Check that every key in `offset` exists in `map`, then move along it.
///
/// Nothing is moved when a key is missing.
pub fn try_move_by<K, V>(
    map: &mut HashMap<K, V>,
    offset: KeyedTangent<K, V::Tangent>,
) -> Result<()>
where
    K: Eq + Hash + Debug,
    V: Differentiable,
{
    if let Some(key) = offset.entries.keys().find(|k| !map.contains_key(*k)) {
        return Err(Error::MissingKey {
            key: format!("{key:?}"),
        });
    }
    for (key, direction) in offset.entries {
        if let Some(value) = map.get_mut(&key) {
            value.move_by(direction);
        }
    }
    Ok(())
}

impl<K, V> Differentiable for HashMap<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Differentiable,
{
    type Tangent = KeyedTangent<K, V::Tangent>;

    fn move_by(&mut self, offset: Self::Tangent) {
        if let Err(e) = try_move_by(self, offset) {
            panic!("{e}");
        }
    }
}

/// Read `map[key]`, with pullback.
///
/// A present key pulls back to the single-entry tangent `{key: d}`. A missing
/// key reads as `None` and pulls back to zero.
pub fn vjp_get<K, V>(
    map: &HashMap<K, V>,
    key: &K,
) -> (Option<V>, impl Fn(OptionTangent<V::Tangent>) -> KeyedTangent<K, V::Tangent>)
where
    K: Eq + Hash + Clone,
    V: Differentiable,
{
    let value = map.get(key).cloned();
    let touched = value.as_ref().map(|_| key.clone());
    (value, move |tangent: OptionTangent<V::Tangent>| {
        let mut d_map = KeyedTangent::new();
        if let (Some(key), Some(d)) = (touched.as_ref(), tangent.into_inner()) {
            d_map.entries.insert(key.clone(), d);
        }
        d_map
    })
}

// ══════════════════════════════════════════════
//  KeyedAccessor
// ══════════════════════════════════════════════

/// A hash map with a staged register for keyed differentiable access.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(
        serialize = "K: serde::Serialize + Eq + Hash, V: serde::Serialize",
        deserialize = "K: serde::Deserialize<'de> + Eq + Hash, V: serde::Deserialize<'de>"
    ))
)]
pub struct KeyedAccessor<K, V> {
    entries: HashMap<K, V>,
    staged: Option<V>,
}

/// Tangent of a [`KeyedAccessor`].
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(
        serialize = "K: serde::Serialize + Eq + Hash, T: serde::Serialize",
        deserialize = "K: serde::Deserialize<'de> + Eq + Hash, T: serde::Deserialize<'de>"
    ))
)]
pub struct KeyedAccessorTangent<K, T> {
    pub(crate) entries: KeyedTangent<K, T>,
    pub(crate) staged: T,
}

impl<K: Eq + Hash, T: PartialEq> PartialEq for KeyedAccessorTangent<K, T> {
    fn eq(&self, other: &Self) -> bool {
        self.staged == other.staged && self.entries == other.entries
    }
}

impl<K, T> KeyedAccessorTangent<K, T> {
    #[inline]
    pub fn from_parts(entries: KeyedTangent<K, T>, staged: T) -> Self {
        KeyedAccessorTangent { entries, staged }
    }

    #[inline]
    pub fn entries(&self) -> &KeyedTangent<K, T> {
        &self.entries
    }

    #[inline]
    pub fn staged(&self) -> &T {
        &self.staged
    }

    #[inline]
    pub fn into_parts(self) -> (KeyedTangent<K, T>, T) {
        (self.entries, self.staged)
    }
}

impl<K: Eq + Hash, T: TangentVector> KeyedAccessorTangent<K, T> {
    /// A tangent with the given entries and a zero staged slot.
    pub fn from_entries(entries: KeyedTangent<K, T>) -> Self {
        KeyedAccessorTangent {
            entries,
            staged: T::zero(),
        }
    }

    #[inline]
    pub fn accumulate_staged(&mut self, d: T) {
        let staged = std::mem::replace(&mut self.staged, T::zero());
        self.staged = staged + d;
    }

    #[inline]
    pub fn take_staged(&mut self) -> T {
        std::mem::replace(&mut self.staged, T::zero())
    }
}

impl<K, V> KeyedAccessor<K, V> {
    pub fn new(entries: HashMap<K, V>) -> Self {
        KeyedAccessor {
            entries,
            staged: None,
        }
    }

    /// Number of keys. Not differentiable.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The register filled by the most recent [`stage`](Self::stage); `None`
    /// when that key was absent.
    #[inline]
    pub fn staged(&self) -> Option<&V> {
        self.staged.as_ref()
    }

    #[inline]
    pub fn as_map(&self) -> &HashMap<K, V> {
        &self.entries
    }

    pub fn into_map(self) -> HashMap<K, V> {
        log::trace!("keyed accessor: releasing {} entries", self.entries.len());
        self.entries
    }
}

impl<K, V> From<HashMap<K, V>> for KeyedAccessor<K, V> {
    fn from(entries: HashMap<K, V>) -> Self {
        KeyedAccessor::new(entries)
    }
}

impl<K: Eq + Hash, V> FromIterator<(K, V)> for KeyedAccessor<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        KeyedAccessor::new(iter.into_iter().collect())
    }
}

impl<K: Eq + Hash, V> KeyedAccessor<K, V> {
    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    #[inline]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Insert or overwrite the entry for `key`.
    #[inline]
    pub fn commit(&mut self, key: K, value: V) {
        self.entries.insert(key, value);
    }
}

impl<K: Eq + Hash, V: Clone> KeyedAccessor<K, V> {
    /// Copy the entry for `key` into the staged register. A missing key stages
    /// `None`.
    #[inline]
    pub fn stage(&mut self, key: &K) {
        self.staged = self.entries.get(key).cloned();
    }
}

impl<K, V> KeyedAccessor<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Differentiable,
{
    /// Read the entry for `key`, with pullback into the accessor tangent.
    pub fn vjp_get(
        &self,
        key: &K,
    ) -> (
        Option<V>,
        impl Fn(OptionTangent<V::Tangent>) -> KeyedAccessorTangent<K, V::Tangent>,
    ) {
        let (value, pullback) = vjp_get(&self.entries, key);
        (value, move |tangent: OptionTangent<V::Tangent>| {
            KeyedAccessorTangent::from_entries(pullback(tangent))
        })
    }

    /// [`stage`](Self::stage) with pullback.
    ///
    /// The pullback moves the staged tangent into the entry for `key`. When
    /// the key was absent at stage time the staged tangent is dropped: nothing
    /// was read, so nothing flows back.
    pub fn vjp_stage(&mut self, key: &K) -> impl Fn(&mut KeyedAccessorTangent<K, V::Tangent>) {
        self.stage(key);
        let touched = self.staged.as_ref().map(|_| key.clone());
        move |tangent| {
            let d_staged = tangent.take_staged();
            if let Some(key) = touched.as_ref() {
                tangent.entries.accumulate(key.clone(), d_staged);
            }
        }
    }

    /// [`commit`](Self::commit) with pullback.
    ///
    /// The pullback moves the entry for `key` out of the incoming tangent and
    /// returns it as the sensitivity of `value`. An absent entry is zero, so
    /// no other key is ever materialized. O(1).
    pub fn vjp_commit(
        &mut self,
        key: K,
        value: V,
    ) -> impl Fn(&mut KeyedAccessorTangent<K, V::Tangent>) -> V::Tangent {
        self.commit(key.clone(), value);
        move |tangent| tangent.entries.take(&key)
    }

    /// [`commit`](Self::commit) with a materializing pullback.
    ///
    /// When the incoming tangent holds fewer entries than the primal has keys,
    /// the pullback first fills in an explicit zero for every primal key, then
    /// extracts the entry for `key` and leaves zero behind. O(N) on that path;
    /// prefer [`vjp_commit`](Self::vjp_commit) unless a dense keyed tangent is
    /// needed downstream.
    pub fn vjp_commit_materialized(
        &mut self,
        key: K,
        value: V,
    ) -> impl Fn(&mut KeyedAccessorTangent<K, V::Tangent>) -> V::Tangent {
        self.commit(key.clone(), value);
        let keys: Vec<K> = self.entries.keys().cloned().collect();
        move |tangent| {
            if tangent.entries.len() < keys.len() {
                log::debug!(
                    "keyed accessor: materializing {} zero tangents ({} present)",
                    keys.len(),
                    tangent.entries.len()
                );
                for k in &keys {
                    tangent
                        .entries
                        .entries
                        .entry(k.clone())
                        .or_insert_with(V::Tangent::zero);
                }
            }
            match tangent.entries.entries.get_mut(&key) {
                Some(slot) => std::mem::replace(slot, V::Tangent::zero()),
                None => V::Tangent::zero(),
            }
        }
    }

    /// Check that `offset` names only keys this accessor holds, then move
    /// along it.
    ///
    /// When the register is empty (the last [`stage`](Self::stage) named a
    /// missing key) the staged offset is discarded, as in the
    /// [`vjp_stage`](Self::vjp_stage) pullback: nothing was read, so there is
    /// nothing to move.
    pub fn try_move_by(&mut self, offset: KeyedAccessorTangent<K, V::Tangent>) -> Result<()> {
        let (entries, staged) = offset.into_parts();
        try_move_by(&mut self.entries, entries)?;
        if let Some(value) = self.staged.as_mut() {
            value.move_by(staged);
        }
        Ok(())
    }
}

impl<K, V> Differentiable for KeyedAccessor<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Differentiable,
{
    type Tangent = KeyedAccessorTangent<K, V::Tangent>;

    fn move_by(&mut self, offset: Self::Tangent) {
        if let Err(e) = self.try_move_by(offset) {
            panic!("{e}");
        }
    }
}
