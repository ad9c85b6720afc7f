//! Rayon or sequential iteration, selected by the `parallel` feature.
//!
//! Algorithms import `crate::maybe_rayon::*` and call `into_par_iter()`.
//! Without the feature the call resolves to a plain `into_iter()`, so the
//! same chain of `.map()` / `.flat_map()` / `.collect()` compiles either way.

#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    /// Sequential stand-in for `rayon::prelude::IntoParallelIterator`
    pub trait IntoParallelIterator {
        type Iter;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }
}

#[cfg(not(feature = "parallel"))]
pub use sequential::*;
