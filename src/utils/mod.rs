pub mod math;
pub mod validation;
