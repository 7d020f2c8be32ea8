//! Game-theoretic core of the model checker: parity game storage, graph
//! views, qualitative and quantitative solvers.

mod attractor;
pub mod config;
pub mod game;
pub mod index;
pub mod qualitative;
pub mod quantitative;
pub mod reach;
pub mod strategy;
pub mod view;

pub use attractor::{strong_attractor, weak_attractor};

pub type Set<T> = indexmap::IndexSet<T, rustc_hash::FxBuildHasher>;
pub type Map<K, V> = rustc_hash::FxHashMap<K, V>;
