pub mod error;
pub mod events;
pub mod fields;
pub mod retry;
pub mod snapshot;
pub mod store;
pub mod validator;

#[cfg(test)]
mod validator_test;
