pub mod error;
pub mod events;
pub mod merge;
pub mod ports;
pub mod records;
pub mod repos;
pub mod rules;
pub mod service;

#[cfg(test)]
mod service_test;
