pub mod comparison;
pub mod institution;

pub use comparison::ComparisonSnapshot;
pub use institution::{Coordinates, Institution, InstitutionType, SupportProfile};
