pub mod consultation;
pub mod doctor;
pub mod filters;
pub mod patient;

pub use consultation::*;
pub use doctor::*;
pub use filters::*;
pub use patient::*;
