use thiserror::Error;

/// Errors reported by [`GrowableBuffer`](crate::GrowableBuffer) operations.
///
/// `site` names the public operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("{site}: failed to allocate {bytes} bytes on the heap")]
    AllocationFailure { site: &'static str, bytes: usize },

    #[error("{site}: failed to free old memory")]
    DeallocationFailure { site: &'static str },

    #[error("{site}: index {index} out of range for size {size}")]
    OutOfRangeAccess {
        site: &'static str,
        index: usize,
        size: usize,
    },

    #[error("{site}: cannot shrink to {requested} slots while {live} elements are live")]
    WouldTruncate {
        site: &'static str,
        requested: usize,
        live: usize,
    },
}

/// Failure half of the status returned by raw block operations.
///
/// Carries no call site, public operations attach one with [`BlockFault::at`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockFault {
    /// the heap could not hand out `bytes` bytes (or the size overflowed)
    Alloc { bytes: usize },
    /// the heap refused to take a block back
    Dealloc,
}

impl BlockFault {
    #[inline]
    pub fn at(self, site: &'static str) -> BufferError {
        match self {
            BlockFault::Alloc { bytes } => BufferError::AllocationFailure { site, bytes },
            BlockFault::Dealloc => BufferError::DeallocationFailure { site },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_gets_call_site() {
        let e = BlockFault::Alloc { bytes: 64 }.at("push_back");
        assert_eq!(
            e,
            BufferError::AllocationFailure {
                site: "push_back",
                bytes: 64
            }
        );
        assert_eq!(e.to_string(), "push_back: failed to allocate 64 bytes on the heap");

        let e = BlockFault::Dealloc.at("destroy");
        assert_eq!(e.to_string(), "destroy: failed to free old memory");
    }

    #[test]
    fn messages_name_the_operation() {
        let e = BufferError::OutOfRangeAccess {
            site: "at",
            index: 7,
            size: 3,
        };
        assert_eq!(e.to_string(), "at: index 7 out of range for size 3");

        let e = BufferError::WouldTruncate {
            site: "reallocate",
            requested: 2,
            live: 5,
        };
        assert_eq!(
            e.to_string(),
            "reallocate: cannot shrink to 2 slots while 5 elements are live"
        );
    }
}
