pub mod applications;
pub mod ios;
