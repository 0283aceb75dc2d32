pub mod _errors;
pub mod _operation;
pub mod _types;
