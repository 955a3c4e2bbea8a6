pub mod convert;
pub mod summary;
