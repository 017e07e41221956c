//! # Racer abstraction.
//!
//! - [`Racer`] - named closure-backed unit of work raced by [`race`](crate::race)

mod racer;

pub use racer::Racer;
