pub mod compiler;
pub mod error;
pub mod expression;
pub mod select;
pub mod token;
pub mod types;
