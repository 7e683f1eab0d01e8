//! Software rendering into a double-buffered linear framebuffer: shapes
//! through [`Brush`], text through [`TextRenderer`].

pub mod brush;
pub mod color;
pub mod framebuffer;
pub mod text;

pub use brush::Brush;
pub use color::Color;
pub use framebuffer::FrameBuffer;
pub use text::TextRenderer;
