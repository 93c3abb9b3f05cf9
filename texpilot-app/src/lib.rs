//! The document-agent side of texpilot: snapshot in, cleaned LaTeX out.

pub mod display;
pub mod pipeline;
