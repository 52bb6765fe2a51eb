//! PDF output: standard-14 fonts, a paginated canvas and the lopdf writer.

pub mod canvas;
pub mod fonts;
pub mod writer;

pub use canvas::{Canvas, Layout, Page, Rgb, TextStyle};
pub use fonts::Font;
pub use writer::write_pdf;
