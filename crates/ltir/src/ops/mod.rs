//! Operation-node families.
//!
//! Each family is a small [`Node`](crate::node::Node) implementation with a
//! `class_op_kind()` accessor, a validating constructor that computes output shapes eagerly, and
//! a public shape rule where the rule is worth reusing on its own.
pub mod device_data;
pub mod dims;
pub mod expand;
pub mod narrow;
pub mod permute;
pub mod split;
pub mod squeeze;
pub mod transpose;
pub mod view;

pub use device_data::DeviceData;
pub use dims::Dims;
pub use expand::{Expand, ExpandSizes};
pub use narrow::Narrow;
pub use permute::Permute;
pub use split::Split;
pub use squeeze::{Squeeze, Unsqueeze};
pub use transpose::Transpose;
pub use view::View;
