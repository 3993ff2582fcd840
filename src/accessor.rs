//! Sparse accessor: amortized O(1) indexed reads and writes under reverse-mode AD.
//!
//! [`Accessor<E>`] wraps a dense buffer plus a single *staged* register.
//! A read is split into two steps: [`Accessor::stage`] copies `values[i]` into
//! the register, and the caller then reads [`Accessor::staged`]. The pullback
//! of `stage` needs only to move the register's sensitivity into slot `i`, so
//! no full-length zero tangent is ever built.
//!
//! The tangent, [`AccessorTangent<T>`], stores a *variable-length* prefix of
//! element sensitivities. Entries past its end are implicitly zero. It grows
//! only as far as the highest index the backward pass touches. Adding a tangent
//! with an empty prefix is O(1) and reuses the other operand's buffer.

use num_traits::Zero;

use crate::dense::VecTangent;
use crate::differentiable::{Differentiable, TangentVector};
use crate::error::{Error, Result};

/// A dense buffer with a staged register for O(1) differentiable access.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Accessor<E> {
    values: Vec<E>,
    staged: E,
}

/// Tangent of an [`Accessor`]: a sparse prefix of element tangents plus the
/// staged register's tangent.
///
/// Invariant: `values.len()` never exceeds the primal length. Trailing entries
/// that are zero can be dropped with [`collapse`](Self::collapse) without
/// changing the value.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccessorTangent<T> {
    pub(crate) values: Vec<T>,
    pub(crate) staged: T,
}

// ══════════════════════════════════════════════
//  Accessor
// ══════════════════════════════════════════════

impl<E: Default> Accessor<E> {
    /// Wrap `values`, with a default-valued staged register. O(N) in the
    /// sense that it takes ownership of the whole buffer.
    pub fn new(values: Vec<E>) -> Self {
        Accessor {
            values,
            staged: E::default(),
        }
    }
}

impl<E: Default> From<Vec<E>> for Accessor<E> {
    fn from(values: Vec<E>) -> Self {
        Accessor::new(values)
    }
}

impl<E: Default> FromIterator<E> for Accessor<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Accessor::new(iter.into_iter().collect())
    }
}

impl<E> Accessor<E> {
    /// Wrap `values` with an explicit staged register.
    pub fn with_staged(values: Vec<E>, staged: E) -> Self {
        Accessor { values, staged }
    }

    /// Number of elements. Not differentiable.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The register filled by the most recent [`stage`](Self::stage).
    #[inline]
    pub fn staged(&self) -> &E {
        &self.staged
    }

    /// Borrow the buffer without any derivative tracking.
    #[inline]
    pub fn as_slice(&self) -> &[E] {
        &self.values
    }

    /// Write `value` into `values[index]`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn commit(&mut self, index: usize, value: E) {
        self.values[index] = value;
    }

    /// Insert `value` at the head of the buffer, shifting everything right.
    pub fn insert_front(&mut self, value: E) {
        self.values.insert(0, value);
    }

    /// Give up the accessor and return the plain buffer.
    ///
    /// This is the O(N) exit point; use it only where the accessor is no
    /// longer needed.
    pub fn into_vec(self) -> Vec<E> {
        log::trace!("accessor: releasing {} elements to a dense vec", self.values.len());
        self.values
    }

    /// Map every element, including the staged register. Not differentiable.
    pub fn map_values<R>(&self, mut transform: impl FnMut(&E) -> R) -> Accessor<R> {
        Accessor {
            values: self.values.iter().map(&mut transform).collect(),
            staged: transform(&self.staged),
        }
    }
}

impl<E: Clone> Accessor<E> {
    /// Copy `values[index]` into the staged register.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn stage(&mut self, index: usize) {
        self.staged = self.values[index].clone();
    }

    /// Copy the buffer out. O(N).
    pub fn to_vec(&self) -> Vec<E> {
        log::trace!("accessor: copying {} elements to a dense vec", self.values.len());
        self.values.clone()
    }
}

impl<E: Differentiable> Accessor<E> {
    /// [`stage`](Self::stage) with pullback.
    ///
    /// The pullback moves the staged tangent into slot `index` of the incoming
    /// tangent (growing it with zeros if it is shorter) and zeroes the staged
    /// slot. Growth is paid once per new maximum index, not per access.
    pub fn vjp_stage(&mut self, index: usize) -> impl Fn(&mut AccessorTangent<E::Tangent>) {
        self.stage(index);
        let count = self.values.len();
        move |tangent| {
            let d_staged = tangent.take_staged();
            tangent.accumulate(index, d_staged);
            debug_assert!(tangent.values.len() <= count);
        }
    }

    /// [`commit`](Self::commit) with pullback.
    ///
    /// The pullback takes the sensitivity at `index` out of the incoming
    /// tangent (leaving zero) and returns it as the sensitivity of `value`.
    /// An index past the stored prefix yields zero without growing anything.
    pub fn vjp_commit(
        &mut self,
        index: usize,
        value: E,
    ) -> impl Fn(&mut AccessorTangent<E::Tangent>) -> E::Tangent {
        self.commit(index, value);
        let count = self.values.len();
        move |tangent| {
            debug_assert!(tangent.values.len() <= count);
            tangent.take(index)
        }
    }

    /// [`insert_front`](Self::insert_front) with pullback.
    ///
    /// The pullback removes the head entry of the incoming tangent and
    /// returns it, shifting the remaining sensitivities back into place.
    pub fn vjp_insert_front(
        &mut self,
        value: E,
    ) -> impl Fn(&mut AccessorTangent<E::Tangent>) -> E::Tangent {
        self.insert_front(value);
        move |tangent| {
            if tangent.values.is_empty() {
                E::Tangent::zero()
            } else {
                tangent.values.remove(0)
            }
        }
    }

    /// Build an accessor from a dense buffer, with pullback.
    ///
    /// The pullback pads the sparse tangent out to the buffer's full length
    /// and returns the staged tangent separately. O(N).
    ///
    /// # Panics
    ///
    /// The pullback panics if the incoming tangent is longer than the buffer.
    pub fn vjp_from_vec(
        values: Vec<E>,
        staged: E,
    ) -> (
        Self,
        impl Fn(AccessorTangent<E::Tangent>) -> (VecTangent<E::Tangent>, E::Tangent),
    ) {
        let count = values.len();
        let accessor = Accessor::with_staged(values, staged);
        (accessor, move |tangent: AccessorTangent<E::Tangent>| {
            log::trace!(
                "accessor: padding tangent of {} to {count} entries",
                tangent.values.len()
            );
            let AccessorTangent { mut values, staged } = tangent;
            assert!(
                values.len() <= count,
                "tangent of length {} exceeds primal length {count}",
                values.len()
            );
            values.resize(count, E::Tangent::zero());
            (VecTangent::new(values), staged)
        })
    }

    /// Copy the buffer out, with pullback.
    ///
    /// The pullback maps a dense tangent back to the sparse representation,
    /// collapsing an all-zero tangent to the empty one. O(N).
    pub fn vjp_to_vec(
        &self,
    ) -> (Vec<E>, impl Fn(VecTangent<E::Tangent>) -> AccessorTangent<E::Tangent>) {
        (self.to_vec(), |tangent: VecTangent<E::Tangent>| {
            let values = if tangent.as_slice().iter().all(Zero::is_zero) {
                Vec::new()
            } else {
                tangent.into_vec()
            };
            AccessorTangent::from_values(values)
        })
    }

    /// Check that `offset` fits this accessor, then move along it.
    pub fn try_move_by(&mut self, offset: AccessorTangent<E::Tangent>) -> Result<()> {
        if offset.values.len() > self.values.len() {
            return Err(Error::TangentTooLong {
                primal: self.values.len(),
                tangent: offset.values.len(),
            });
        }
        self.staged.move_by(offset.staged);
        for (value, direction) in self.values.iter_mut().zip(offset.values) {
            value.move_by(direction);
        }
        Ok(())
    }
}

impl<E: Differentiable> Differentiable for Accessor<E> {
    type Tangent = AccessorTangent<E::Tangent>;

    fn move_by(&mut self, offset: Self::Tangent) {
        if let Err(e) = self.try_move_by(offset) {
            panic!("{e}");
        }
    }
}

// ══════════════════════════════════════════════
//  AccessorTangent
// ══════════════════════════════════════════════

impl<T> AccessorTangent<T> {
    #[inline]
    pub fn from_parts(values: Vec<T>, staged: T) -> Self {
        AccessorTangent { values, staged }
    }

    /// Stored prefix length. Entries at or beyond it are zero.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no element sensitivities are stored. The staged tangent may
    /// still be non-zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    #[inline]
    pub fn staged(&self) -> &T {
        &self.staged
    }

    #[inline]
    pub fn into_parts(self) -> (Vec<T>, T) {
        (self.values, self.staged)
    }
}

impl<T: TangentVector> AccessorTangent<T> {
    /// A tangent with the given element prefix and a zero staged slot.
    pub fn from_values(values: Vec<T>) -> Self {
        AccessorTangent {
            values,
            staged: T::zero(),
        }
    }

    /// Add `d` to the staged tangent.
    #[inline]
    pub fn accumulate_staged(&mut self, d: T) {
        let staged = std::mem::replace(&mut self.staged, T::zero());
        self.staged = staged + d;
    }

    /// Move the staged tangent out, leaving zero.
    #[inline]
    pub fn take_staged(&mut self) -> T {
        std::mem::replace(&mut self.staged, T::zero())
    }

    /// Add `d` to slot `index`, growing the prefix with zeros if needed.
    pub fn accumulate(&mut self, index: usize, d: T) {
        if index < self.values.len() {
            let current = std::mem::replace(&mut self.values[index], T::zero());
            self.values[index] = current + d;
        } else {
            self.values.resize(index, T::zero());
            self.values.push(d);
        }
    }

    /// Move slot `index` out, leaving zero. Slots past the prefix are zero.
    pub fn take(&mut self, index: usize) -> T {
        match self.values.get_mut(index) {
            Some(slot) => std::mem::replace(slot, T::zero()),
            None => T::zero(),
        }
    }

    /// Slot `index`, zero if it lies past the stored prefix.
    pub fn get(&self, index: usize) -> T {
        self.values.get(index).cloned().unwrap_or_else(T::zero)
    }

    /// Drop trailing zero entries. The represented value is unchanged.
    pub fn collapse(&mut self) {
        while self.values.last().is_some_and(Zero::is_zero) {
            self.values.pop();
        }
    }

    /// Expand the element prefix to `len` entries. O(len).
    ///
    /// # Panics
    ///
    /// Panics if the stored prefix is already longer than `len`.
    pub fn to_dense(&self, len: usize) -> Vec<T> {
        assert!(
            self.values.len() <= len,
            "tangent of length {} exceeds primal length {len}",
            self.values.len()
        );
        let mut dense = self.values.clone();
        dense.resize(len, T::zero());
        dense
    }
}
