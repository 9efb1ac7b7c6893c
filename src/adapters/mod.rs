//! Typed facades over [`crate::stream::BidirectionalStream`] for callers
//! that only ever deal in one media kind.

pub mod audio;
pub mod bytes;
pub mod text;

pub use audio::AudioAdapter;
pub use bytes::{ByteReader, ByteWriter};
pub use text::TextAdapter;
