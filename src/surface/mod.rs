//! Drawing targets: the preview the feed is bound to and the off-screen
//! bitmap frames are sampled into

pub mod bitmap;
pub mod video;

pub use bitmap::BitmapSurface;
pub use video::{PlaybackState, PreviewSurface, ReadyState, SharedVideoSurface, VideoSurface};
