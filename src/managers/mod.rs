pub mod gateway;
pub mod status;
