pub mod html;
pub mod logging;

pub use html::{escape_html, format_filename};
