pub mod dates;
pub mod tags;
