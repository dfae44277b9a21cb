pub mod index;
pub mod weather;
