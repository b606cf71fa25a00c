pub mod file;
pub mod mysql;
