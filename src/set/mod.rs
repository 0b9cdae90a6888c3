pub mod enumerable;

pub use enumerable::EnumerableSet;
