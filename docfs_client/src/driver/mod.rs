use driver_error::DriverError;

pub mod coordinator_driver;
pub mod driver_error;
pub mod node_driver;

pub type DriverResult<T> = Result<T, DriverError>;
