/*!
This crate provides [`GrowableBuffer`], a growable contiguous array built directly on raw heap blocks
instead of on top of `Vec`.

Every step of a value's life is explicit: the block is acquired from the heap, values are written
into its spare tail, destroyed newest first and the block is handed back.
Growth never happens in place, a full buffer moves into a block twice its size
(starting at [`INITIAL_CAPACITY`]), so any growth invalidates pointers into the old block.

All fallible operations return a [`BufferError`] that names the operation that failed.
Dropping a buffer never reports an error, a block the heap refuses to take back is logged and the process aborts.

# Examples

## Appending and reading

```rust
use growable_buffer::{BufferError, GrowableBuffer};

let mut buf = GrowableBuffer::new();
buf.push_back(10u32)?;
buf.pack_back([20, 30, 40, 50])?;

assert_eq!(buf.size(), 5);
assert_eq!(buf.capacity(), 8);
assert_eq!(buf[1], 20);
assert_eq!(buf.last()?, &50);

// indexed access past the end is an error, not a read
assert!(matches!(buf.at(5), Err(BufferError::OutOfRangeAccess { index: 5, size: 5, .. })));
# Ok::<(), BufferError>(())
```

## Construction variants

```rust
use growable_buffer::{growable, GrowableBuffer};

// a literal sequence is sized exactly
let exact = GrowableBuffer::try_from([1, 2, 3]).unwrap();
assert_eq!(exact.capacity(), 3);

// a pack is appended one value at a time
let packed = growable![1, 2, 3].unwrap();
assert_eq!(packed.capacity(), 4);
assert_eq!(exact, packed);

// copies keep the capacity of their source
let copy = packed.clone();
assert_eq!(copy.capacity(), 4);

// ranges can be taken in either direction
let back = GrowableBuffer::from_reverse_range(exact.as_slice()).unwrap();
assert_eq!(back, [3, 2, 1]);
```

## Moving blocks around

```rust
use growable_buffer::GrowableBuffer;

let mut src = GrowableBuffer::try_from([String::from("a"), String::from("b")]).unwrap();
let base = src.as_ptr();

// taking is O(1), the block itself changes hands
let dst = GrowableBuffer::take_from(&mut src);
assert_eq!(dst.as_ptr(), base);
assert_eq!(src.capacity(), 0);
```
*/

pub mod block;
pub mod buffer;
pub mod error;
pub mod heap;

pub use buffer::{GROWTH_FACTOR, GrowableBuffer, INITIAL_CAPACITY};
pub use error::BufferError;

/// Builds a [`GrowableBuffer`] from a list of values, appending them in order.
///
/// Evaluates to `Result<GrowableBuffer<_>, BufferError>`.
/// The capacity grows as it would for repeated [`push_back`](GrowableBuffer::push_back) calls.
///
/// ```rust
/// use growable_buffer::growable;
///
/// let buf = growable![1, 2, 3, 4, 5].unwrap();
/// assert_eq!(buf.capacity(), 8);
///
/// let empty = growable![].map(|b: growable_buffer::GrowableBuffer<u8>| b.capacity());
/// assert_eq!(empty, Ok(0));
/// ```
#[macro_export]
macro_rules! growable {
    () => {
        ::core::result::Result::<_, $crate::BufferError>::Ok($crate::GrowableBuffer::new())
    };
    ($($value:expr),+ $(,)?) => {
        $crate::GrowableBuffer::from_pack([$($value),+])
    };
}
