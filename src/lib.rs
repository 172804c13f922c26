pub mod algebra;
pub mod ast;
pub mod dataset;
pub mod error;
pub mod executor;
pub mod operator;
pub mod parser;
pub mod validator;
pub mod value;

pub use algebra::DataLoader;
pub use dataset::DataSet;
pub use error::{Error, Result};
pub use executor::execute;
pub use parser::parse_program;
pub use validator::{validate, SemanticError};
pub use value::Value;

#[cfg(test)]
mod tests;
