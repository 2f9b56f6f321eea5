pub mod adapters;
pub mod archive;
pub mod common;
pub mod domain;
pub mod numerics;
pub mod pipeline;
pub mod spectrum;
