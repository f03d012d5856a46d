pub mod error;
pub mod graph;
pub mod parse;
pub mod transform;

#[cfg(test)]
mod tests;
