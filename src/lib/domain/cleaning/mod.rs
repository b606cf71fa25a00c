pub mod coerce;
pub mod expression;
pub mod options;
pub mod pipeline;
pub mod text;

pub use expression::Expression;
pub use options::CleanOptions;
pub use pipeline::clean;
