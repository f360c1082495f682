pub mod errors;
pub mod db;
pub mod student;
pub mod token;

#[cfg(test)]
mod tests;
