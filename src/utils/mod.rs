pub mod escape;
pub mod instagram;
