//! Fixed-function style math used by the lessons.

mod matrix;
mod random;

pub use matrix::Mtx;
pub use random::Random;
