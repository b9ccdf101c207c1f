// Protocol layer - Sensor wire format, framing and extraction, no I/O
pub mod accumulator;
pub mod extractor;
pub mod framer;
