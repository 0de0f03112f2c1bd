pub mod compare;
pub mod generate;
pub mod solve;
pub mod summarize;
