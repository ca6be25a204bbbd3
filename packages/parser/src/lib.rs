pub mod ast;
pub mod error;
pub mod generator;
pub mod locator;
pub mod parser;
pub mod tokenizer;

pub use error::{ParseError, ParseResult};
pub use generator::generate;
pub use locator::find_element_by_location;
pub use parser::{parse, Parser};
pub use tokenizer::{tokenize, Token};
