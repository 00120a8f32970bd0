//! Loading and preparing input graphs

pub mod preprocessing;
pub mod tsv;

pub use preprocessing::filter_by_degree;
pub use tsv::{load_edge_list, parse_edge_list};
