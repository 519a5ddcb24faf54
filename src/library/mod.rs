//! Library tree model and navigation.

pub mod locator;
pub mod model;

pub use model::TreeModel;
