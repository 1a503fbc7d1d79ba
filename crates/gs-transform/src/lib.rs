//! Turns silently discarded Go errors into checked ones.
//!
//! ```text
//! x, _ := strconv.Atoi(s)        var err0 error
//!                           =>   x, err0 := strconv.Atoi(s)
//!                                if err0 != nil {
//!                                    panic(err0)
//!                                }
//! ```
//!
//! `transform` type-checks the package once, then rewrites each function
//! declaration and function literal as an independent unit.

pub mod driver;
pub mod guard;
pub mod names;
pub mod rewriter;

pub use driver::{transform, TransformReport};
pub use names::{ErrVar, NameAllocator};
pub use rewriter::{Rewrite, UnitOutcome, UnitRewriter};

#[cfg(test)]
mod tests;
