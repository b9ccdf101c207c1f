// Presentation layer - Consumer-facing live state and events
pub mod live;
