pub mod check;
pub mod registry;
pub mod token;
