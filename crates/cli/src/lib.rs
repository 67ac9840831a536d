pub mod args;
pub mod convert;
pub mod output;
