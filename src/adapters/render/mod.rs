//! Composite rendering: many candidate images into one labeled grid.

mod glyphs;
pub mod grid;

pub use grid::{
    compose_from_bytes, compose_grid, composite_from_image_bytes, decode_tile,
    GridCompositeRenderer, GridLayout,
};
