mod error_handling;
mod stream;
mod whole;
