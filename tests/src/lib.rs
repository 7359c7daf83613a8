mod integration_test;
pub mod utils;
