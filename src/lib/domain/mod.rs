pub mod audit;
pub mod cleaning;
pub mod models;
pub mod workflow;
