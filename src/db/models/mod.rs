pub mod location_reading;

pub use location_reading::{Coordinates, LocationReading};
