//! Declarative parallel/sequential execution utilities.
//!
//! The `cfg` logic for the `parallel` feature lives here in one place so call
//! sites in the engine stay free of feature gates.
//!
//! # Runtime Override
//!
//! Every helper accepts a `force_sequential` flag. When `true`, execution is
//! sequential even if the `parallel` feature is enabled. Results are always
//! returned in input order, so both paths produce identical output.
//!
//! # Example
//!
//! ```
//! let mut counters = vec![1u32, 2, 3];
//! let doubled = parallel::map_slice_mut(&mut counters, |c| { *c += 1; *c * 2 }, false);
//! assert_eq!(doubled, vec![4, 6, 8]);
//! assert_eq!(counters, vec![2, 3, 4]);
//! ```

#[cfg(feature = "parallel")]
use rayon::prelude::*;

// =============================================================================
// Slice Operations
// =============================================================================

/// Map a function over exclusive references to each element, potentially in parallel.
///
/// Each element is visited by exactly one task, so `f` may mutate the element's
/// own state without locks. The call returns only after every element has been
/// visited.
///
/// # Parameters
/// - `force_sequential`: When true, forces sequential execution even if parallel feature is enabled
#[inline]
pub fn map_slice_mut<T, F, R>(slice: &mut [T], f: F, force_sequential: bool) -> Vec<R>
where
    T: Send,
    F: Fn(&mut T) -> R + Sync + Send,
    R: Send,
{
    #[cfg(feature = "parallel")]
    {
        if force_sequential {
            slice.iter_mut().map(f).collect()
        } else {
            slice.par_iter_mut().map(f).collect()
        }
    }

    #[cfg(not(feature = "parallel"))]
    {
        let _ = force_sequential;
        slice.iter_mut().map(f).collect()
    }
}

/// Whether the crate was built with rayon support.
#[inline]
pub const fn is_parallel_enabled() -> bool {
    cfg!(feature = "parallel")
}
