// Domain layer - Pure data models and rules
pub mod device;
pub mod reading;
