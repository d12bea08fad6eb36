pub mod error;
pub mod location;
pub mod observation;
#[cfg(feature = "api")]
pub mod open_meteo;
pub mod schema;
pub mod source;
