mod console;
mod export;
mod matrix;

pub use console::ConsoleReporter;
pub use export::{HtmlExporter, JsonExporter};
pub use matrix::{MatrixEntry, MethodMatrix};
