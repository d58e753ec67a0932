pub mod code_index;
pub mod document;
pub mod filter;
pub mod markup;
pub mod normalize;
pub mod parser;
pub mod planner;

pub use crate::domain::model::{CatalogExcerpt, Section};
pub use crate::domain::ports::{CatalogSource, Pipeline, Storage};
pub use crate::utils::error::Result;
