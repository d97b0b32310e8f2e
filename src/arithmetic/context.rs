//! Adaptive context state storage.
//!
//! A [`ContextStore`] holds one `(state, mps)` pair per coding context. The
//! decoding procedure that owns the store decides how many contexts it needs
//! and how a pixel neighbourhood or symbol prefix maps to a context index;
//! the store itself is just dense adaptive state.

use super::qe_table::STATE_COUNT;
use crate::error::{Error, Result};

/// Per-context adaptive probability state for the arithmetic decoder.
///
/// Every slot starts at state 0 with MPS 0, the initial condition required by
/// ITU-T T.88 E.3.7. Cloning a store takes a deep snapshot that can later be
/// committed back with [`overwrite`](ContextStore::overwrite).
///
/// # Example
///
/// ```
/// use jbig2_oxide::arithmetic::ContextStore;
///
/// let mut store = ContextStore::new(1 << 16);
/// let checkpoint = store.clone();
/// store.toggle_mps(42).unwrap();
/// assert_ne!(store, checkpoint);
///
/// store.overwrite(&checkpoint);
/// assert_eq!(store, checkpoint);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextStore {
    states: Vec<u8>,
    mps: Vec<u8>,
    selected: usize,
}

impl ContextStore {
    /// Allocate `size` contexts, all at the initial condition.
    pub fn new(size: usize) -> Self {
        Self {
            states: vec![0; size],
            mps: vec![0; size],
            selected: 0,
        }
    }

    /// Number of contexts.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns true if the store has no contexts.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Return every context to the initial condition, keeping the allocation.
    pub fn reset(&mut self) {
        self.states.fill(0);
        self.mps.fill(0);
        self.selected = 0;
    }

    /// Replace this store's contents with a copy of `other`'s.
    ///
    /// The receiver takes on `other`'s size; its allocation is reused when large enough.
    pub fn overwrite(&mut self, other: &ContextStore) {
        self.states.clone_from(&other.states);
        self.mps.clone_from(&other.mps);
        self.selected = other.selected;
    }

    /// Probability estimation state of context `cx`.
    pub fn state(&self, cx: usize) -> Result<u8> {
        self.check_index(cx)?;
        Ok(self.states[cx])
    }

    /// More probable symbol of context `cx`.
    pub fn mps(&self, cx: usize) -> Result<u8> {
        self.check_index(cx)?;
        Ok(self.mps[cx])
    }

    /// Set the state and MPS of context `cx`.
    pub fn set(&mut self, cx: usize, state: u8, mps: u8) -> Result<()> {
        self.check_index(cx)?;
        if state as usize >= STATE_COUNT || mps > 1 {
            return Err(Error::InvalidArgument(format!(
                "invalid context state ({}, mps {})",
                state, mps
            )));
        }
        self.states[cx] = state;
        self.mps[cx] = mps;
        Ok(())
    }

    /// Flip the MPS of context `cx`.
    pub fn toggle_mps(&mut self, cx: usize) -> Result<()> {
        self.check_index(cx)?;
        self.mps[cx] ^= 1;
        Ok(())
    }

    /// Select the context used by
    /// [`ArithmeticDecoder::decode_selected`](super::ArithmeticDecoder::decode_selected).
    pub fn select(&mut self, cx: usize) {
        self.selected = cx;
    }

    /// Currently selected context index.
    pub fn selected(&self) -> usize {
        self.selected
    }

    pub(crate) fn check_index(&self, cx: usize) -> Result<()> {
        if cx >= self.states.len() {
            return Err(Error::InvalidArgument(format!(
                "context index {} out of range for store of {} contexts",
                cx,
                self.states.len()
            )));
        }
        Ok(())
    }

    /// Read context `cx` without bounds checking beyond the slice's own.
    #[inline]
    pub(crate) fn get(&self, cx: usize) -> (usize, u8) {
        (self.states[cx] as usize, self.mps[cx])
    }

    #[inline]
    pub(crate) fn put(&mut self, cx: usize, state: u8, mps: u8) {
        self.states[cx] = state;
        self.mps[cx] = mps;
    }
}
