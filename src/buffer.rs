use crate::block::OwnedBlock;
use crate::error::BufferError;
use core::fmt;
use core::iter::Rev;
use core::mem;
use core::ops::{Deref, DerefMut, Index, IndexMut};
use core::slice;

/// Capacity of the first block a buffer acquires on its own.
pub const INITIAL_CAPACITY: usize = 4;

/// Factor the capacity is multiplied by whenever a full buffer grows.
pub const GROWTH_FACTOR: usize = 2;

/// A growable contiguous array that owns exactly one heap block.
///
/// Growth never happens in place: a full buffer acquires a block [`GROWTH_FACTOR`] times larger,
/// moves its values over and gives the old block back.
/// Any growth invalidates every pointer previously taken with [`as_ptr`](Self::as_ptr).
///
/// Every fallible operation reports a [`BufferError`] naming itself as the call site.
///
/// # Example
///
/// ```rust
/// use growable_buffer::GrowableBuffer;
///
/// let mut buf = GrowableBuffer::new();
/// assert_eq!(buf.capacity(), 0);
///
/// buf.push_back(1).unwrap();
/// assert_eq!(buf.capacity(), 4);
///
/// buf.pack_back([2, 3, 4, 5]).unwrap();
/// assert_eq!(buf.capacity(), 8);
/// assert_eq!(buf.as_slice(), &[1, 2, 3, 4, 5]);
///
/// assert!(buf.at(5).is_err());
/// ```
pub struct GrowableBuffer<T> {
    block: OwnedBlock<T>,
}

/*────────── constructors ──────────*/

impl<T> GrowableBuffer<T> {
    /// Creates an empty buffer. Nothing is allocated until the first insertion.
    #[inline]
    pub const fn new() -> Self {
        Self {
            block: OwnedBlock::empty(),
        }
    }

    /// Creates an empty buffer with room for exactly `capacity` values.
    pub fn with_capacity(capacity: usize) -> Result<Self, BufferError> {
        let block = OwnedBlock::acquire(capacity).map_err(|f| f.at("with_capacity"))?;
        Ok(Self { block })
    }

    /// Creates a buffer by appending `values` one by one, as [`pack_back`](Self::pack_back) does.
    ///
    /// The capacity follows the usual growth from [`INITIAL_CAPACITY`].
    pub fn from_pack<I>(values: I) -> Result<Self, BufferError>
    where
        I: IntoIterator<Item = T>,
    {
        let mut ans = Self::new();
        for v in values {
            ans.push_at("from_pack", v)?;
        }
        Ok(ans)
    }

    /// Clones a sequence of values into a buffer of exactly that size.
    pub fn from_slice(values: &[T]) -> Result<Self, BufferError>
    where
        T: Clone,
    {
        Self::populate("from_slice", values.len(), values.iter().cloned())
    }

    /// Clones every value of `span`, first to last, into a buffer sized to the span.
    pub fn from_forward_range(span: &[T]) -> Result<Self, BufferError>
    where
        T: Clone,
    {
        Self::populate("from_forward_range", span.len(), span.iter().cloned())
    }

    /// Clones every value of `span`, last to first, into a buffer sized to the span.
    ///
    /// ```rust
    /// use growable_buffer::GrowableBuffer;
    ///
    /// let src = GrowableBuffer::try_from([1, 2, 3, 4]).unwrap();
    /// let back = GrowableBuffer::from_reverse_range(&src.as_slice()[..3]).unwrap();
    /// assert_eq!(back, [3, 2, 1]);
    /// assert_eq!(back.capacity(), 3);
    /// ```
    pub fn from_reverse_range(span: &[T]) -> Result<Self, BufferError>
    where
        T: Clone,
    {
        Self::populate("from_reverse_range", span.len(), span.iter().rev().cloned())
    }

    /// Moves the whole block out of `source`, leaving it empty and unallocated.
    ///
    /// No value is touched and nothing is allocated.
    #[inline]
    pub fn take_from(source: &mut Self) -> Self {
        mem::take(source)
    }

    /// Clones the buffer into a fresh block of the same capacity.
    pub fn try_clone(&self) -> Result<Self, BufferError>
    where
        T: Clone,
    {
        Self::populate("try_clone", self.capacity(), self.iter().cloned())
    }

    fn populate<I>(site: &'static str, capacity: usize, values: I) -> Result<Self, BufferError>
    where
        I: Iterator<Item = T>,
    {
        let mut block = OwnedBlock::acquire(capacity).map_err(|f| f.at(site))?;
        for v in values.take(capacity) {
            // SAFETY: at most `capacity` values are written into a block of that capacity
            unsafe { block.construct_back(v).unwrap_unchecked() };
        }
        Ok(Self { block })
    }
}

/*────────── allocation & lifecycle ──────────*/

impl<T> GrowableBuffer<T> {
    /// Drops every value and starts over on a fresh block of `capacity` slots.
    pub fn allocate(&mut self, capacity: usize) -> Result<(), BufferError> {
        self.block.release().map_err(|f| f.at("allocate"))?;
        self.block = OwnedBlock::acquire(capacity).map_err(|f| f.at("allocate"))?;
        Ok(())
    }

    /// Moves every value into a fresh block of `capacity` slots.
    ///
    /// Fails with [`BufferError::WouldTruncate`] rather than dropping values when
    /// `capacity < size()`. On any failure the buffer is left as it was.
    pub fn reallocate(&mut self, capacity: usize) -> Result<(), BufferError> {
        self.relocate("reallocate", capacity)
    }

    /// Drops every value (newest first) and gives the block back.
    ///
    /// The buffer is unallocated afterwards, even on failure, and can be reused.
    pub fn destroy(&mut self) -> Result<(), BufferError> {
        self.block.release().map_err(|f| f.at("destroy"))
    }

    fn relocate(&mut self, site: &'static str, capacity: usize) -> Result<(), BufferError> {
        let live = self.size();
        if capacity < live {
            return Err(BufferError::WouldTruncate {
                site,
                requested: capacity,
                live,
            });
        }
        let mut fresh = OwnedBlock::acquire(capacity).map_err(|f| f.at(site))?;
        let moved = self.block.relocate_into(&mut fresh);
        debug_assert!(moved.is_some(), "fresh block is at least as large as size");
        self.adopt(site, fresh)
    }

    /// Swaps `block` in and releases whatever was owned before.
    fn adopt(&mut self, site: &'static str, block: OwnedBlock<T>) -> Result<(), BufferError> {
        let mut old = mem::replace(&mut self.block, block);
        old.release().map_err(|f| f.at(site))
    }

    fn grow_if_full(&mut self, site: &'static str) -> Result<(), BufferError> {
        if self.block.room_left() > 0 {
            return Ok(());
        }
        let target = match self.capacity() {
            0 => INITIAL_CAPACITY,
            cap => cap
                .checked_mul(GROWTH_FACTOR)
                .ok_or(BufferError::AllocationFailure {
                    site,
                    bytes: usize::MAX,
                })?,
        };
        log::debug!("{site}: growing from {} to {target} slots", self.capacity());
        self.relocate(site, target)
    }
}

/*────────── insertion ──────────*/

impl<T> GrowableBuffer<T> {
    #[inline]
    fn push_at(&mut self, site: &'static str, value: T) -> Result<&mut T, BufferError> {
        self.grow_if_full(site)?;
        // SAFETY: grow_if_full leaves at least one spare slot
        Ok(unsafe { self.block.construct_back(value).unwrap_unchecked() })
    }

    /// Appends `value`, growing if the buffer is full.
    #[inline]
    pub fn push_back(&mut self, value: T) -> Result<(), BufferError> {
        self.push_at("push_back", value).map(|_| ())
    }

    /// Appends a clone of `value`, growing if the buffer is full.
    #[inline]
    pub fn push_back_cloned(&mut self, value: &T) -> Result<(), BufferError>
    where
        T: Clone,
    {
        self.push_at("push_back_cloned", value.clone()).map(|_| ())
    }

    /// Builds a value directly in the slot past the last one and returns it.
    ///
    /// `make` is only called once room has been made, so it never runs if growth fails.
    ///
    /// ```rust
    /// use growable_buffer::GrowableBuffer;
    ///
    /// let mut names = GrowableBuffer::new();
    /// let slot = names.construct_back(|| String::from("ab")).unwrap();
    /// slot.push('c');
    /// assert_eq!(names.first().unwrap(), "abc");
    /// ```
    pub fn construct_back<F>(&mut self, make: F) -> Result<&mut T, BufferError>
    where
        F: FnOnce() -> T,
    {
        self.grow_if_full("construct_back")?;
        // SAFETY: grow_if_full leaves at least one spare slot
        Ok(unsafe { self.block.construct_with(make).unwrap_unchecked() })
    }

    /// Appends every value in order.
    ///
    /// This is a series of single appends: if growth fails partway, the values
    /// appended before the failure stay in the buffer.
    pub fn pack_back<I>(&mut self, values: I) -> Result<(), BufferError>
    where
        I: IntoIterator<Item = T>,
    {
        for v in values {
            self.push_at("pack_back", v)?;
        }
        Ok(())
    }
}

/*────────── access ──────────*/

impl<T> GrowableBuffer<T> {
    #[inline]
    fn out_of_range(&self, site: &'static str, index: usize) -> BufferError {
        BufferError::OutOfRangeAccess {
            site,
            index,
            size: self.size(),
        }
    }

    /// Returns the value at `index`, failing with [`BufferError::OutOfRangeAccess`] past the end.
    #[inline]
    pub fn at(&self, index: usize) -> Result<&T, BufferError> {
        self.block
            .as_slice()
            .get(index)
            .ok_or_else(|| self.out_of_range("at", index))
    }

    #[inline]
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, BufferError> {
        let err = self.out_of_range("at_mut", index);
        self.block.as_mut_slice().get_mut(index).ok_or(err)
    }

    /// Returns the first value, failing on an empty buffer.
    #[inline]
    pub fn first(&self) -> Result<&T, BufferError> {
        self.block
            .as_slice()
            .first()
            .ok_or_else(|| self.out_of_range("first", 0))
    }

    #[inline]
    pub fn first_mut(&mut self) -> Result<&mut T, BufferError> {
        let err = self.out_of_range("first_mut", 0);
        self.block.as_mut_slice().first_mut().ok_or(err)
    }

    /// Returns the last value, failing on an empty buffer.
    #[inline]
    pub fn last(&self) -> Result<&T, BufferError> {
        self.block
            .as_slice()
            .last()
            .ok_or_else(|| self.out_of_range("last", 0))
    }

    #[inline]
    pub fn last_mut(&mut self) -> Result<&mut T, BufferError> {
        let err = self.out_of_range("last_mut", 0);
        self.block.as_mut_slice().last_mut().ok_or(err)
    }

    /// Returns the number of live values.
    #[inline]
    pub fn size(&self) -> usize {
        self.block.len()
    }

    /// Returns the number of slots in the owned block, 0 when nothing is owned.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.block.capacity()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.block.is_empty()
    }

    /// Returns how many values fit before the next growth.
    #[inline]
    pub fn room_left(&self) -> usize {
        self.block.room_left()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.block.as_slice()
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.block.as_mut_slice()
    }

    /// Walks the values first to last.
    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    #[inline]
    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    /// Walks the values last to first.
    #[inline]
    pub fn rev_iter(&self) -> Rev<slice::Iter<'_, T>> {
        self.iter().rev()
    }

    /// Returns the base of the owned block, null when nothing is owned.
    ///
    /// The pointer is only good until the next growth, reallocation or release.
    #[inline(always)]
    pub fn as_ptr(&self) -> *const T {
        self.block.get_base()
    }

    #[inline(always)]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.block.get_base()
    }

    /// Identity of the block handle itself, for telling buffers apart.
    #[inline(always)]
    pub fn address(&self) -> *const () {
        (&self.block as *const OwnedBlock<T>).cast()
    }
}

/*────────── assignment ──────────*/

impl<T> GrowableBuffer<T> {
    /// Replaces the contents with clones of `source`'s values.
    ///
    /// A fresh block of `source.capacity()` slots is always acquired, the old one is
    /// never reused. The old values are only dropped once the copy has fully succeeded.
    pub fn try_assign_from(&mut self, source: &Self) -> Result<(), BufferError>
    where
        T: Clone,
    {
        let fresh = Self::populate("try_assign_from", source.capacity(), source.iter().cloned())?;
        self.adopt("try_assign_from", fresh.into_block())
    }

    /// Drops the current contents and takes over `source`'s block, leaving `source` empty.
    pub fn assign_take(&mut self, source: &mut Self) -> Result<(), BufferError> {
        let block = mem::take(&mut source.block);
        self.adopt("assign_take", block)
    }

    #[inline]
    fn into_block(self) -> OwnedBlock<T> {
        self.block
    }
}

/*────────── traits ──────────*/

impl<T> Default for GrowableBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for GrowableBuffer<T> {
    /// Panics with the [`BufferError`] message if the heap is out of memory.
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(ans) => ans,
            Err(e) => panic!("{e}"),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        if let Err(e) = self.try_assign_from(source) {
            panic!("{e}");
        }
    }
}

impl<T, const N: usize> TryFrom<[T; N]> for GrowableBuffer<T> {
    type Error = BufferError;

    /// Moves the values into a buffer of exactly `N` slots.
    fn try_from(values: [T; N]) -> Result<Self, BufferError> {
        Self::populate("try_from", N, values.into_iter())
    }
}

impl<T: fmt::Debug> fmt::Debug for GrowableBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for GrowableBuffer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for GrowableBuffer<T> {}

impl<T: PartialEq> PartialEq<[T]> for GrowableBuffer<T> {
    fn eq(&self, other: &[T]) -> bool {
        self.as_slice() == other
    }
}

impl<T: PartialEq, const N: usize> PartialEq<[T; N]> for GrowableBuffer<T> {
    fn eq(&self, other: &[T; N]) -> bool {
        self.as_slice() == other
    }
}

impl<T> Deref for GrowableBuffer<T> {
    type Target = [T];
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for GrowableBuffer<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

/*────────── Index / IndexMut ──────────*/

impl<T> Index<usize> for GrowableBuffer<T> {
    type Output = T;
    fn index(&self, id: usize) -> &T {
        match self.at(id) {
            Ok(v) => v,
            Err(e) => panic!("{e}"),
        }
    }
}

impl<T> IndexMut<usize> for GrowableBuffer<T> {
    fn index_mut(&mut self, id: usize) -> &mut T {
        let size = self.size();
        match self.block.as_mut_slice().get_mut(id) {
            Some(v) => v,
            None => panic!(
                "{}",
                BufferError::OutOfRangeAccess {
                    site: "index_mut",
                    index: id,
                    size,
                }
            ),
        }
    }
}

impl<'a, T> IntoIterator for &'a GrowableBuffer<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut GrowableBuffer<T> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/*──────────────────── tests ───────────────────────────*/
