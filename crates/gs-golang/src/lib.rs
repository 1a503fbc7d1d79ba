//! Go language support: parsing and printing.

pub mod frontend;
pub mod parser;
pub mod serializer;

pub use frontend::GoFrontend;
pub use parser::GoParser;
pub use serializer::GoSerializer;

#[cfg(test)]
mod tests;
