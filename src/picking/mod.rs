//! Point picking: index-encoded colors and id buffers
//!
//! A renderer writes `codec::encode(i)` as the RGBA color of point `i`; the
//! readback is decoded per pixel into an [`IdBuffer`] without lookup tables.

pub mod codec;
pub mod id_buffer;

pub use codec::EMPTY;
pub use id_buffer::{IdBuffer, flatten_and_filter};
