//! Structural and security filters.
//!
//! Each filter is an independent in-place transform of a [`DomTree`](crate::DomTree)
//! built on the [`walk`](crate::walk) module. Filters share no state; the
//! [`pipeline`](crate::pipeline) module decides the order they run in.

pub mod attributes;
pub mod elements;
pub mod frames;
pub mod hidden;
pub mod image_size;
pub mod images;
pub mod structure;
pub mod telemetry;
pub mod whitespace;

pub use attributes::{filter_attribute_whitelist, remove_empty_attributes};
pub use elements::{filter_embeds, remove_blacklisted_elements, remove_comments, remove_script_elements};
pub use frames::normalize_frames;
pub use hidden::remove_hidden_elements;
pub use image_size::{Dimensions, ImageFetcher, infer_image_sizes, infer_image_sizes_offline};
pub use images::{collapse_responsive_images, normalize_lazy_images, remove_sourceless_images};
pub use structure::{
    condense_line_breaks, normalize_lists, normalize_tables, unwrap_formatting_elements, unwrap_long_emphasis,
    unwrap_nameless_anchors,
};
pub use telemetry::{remove_telemetry_images, remove_tiny_images};
pub use whitespace::{condense_whitespace, remove_leaf_elements, trim_document};
