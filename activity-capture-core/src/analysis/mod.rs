pub mod summary;
pub mod remote;
