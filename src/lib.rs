pub mod macros;

pub mod address;
pub mod batch;
pub mod bls;
pub mod commitment;
pub mod config;
pub mod deposit;
pub mod domain;
pub mod errors;
pub mod helpers;
pub mod keygen;
pub mod logger;
pub mod network;
pub mod ssz;
pub mod verify;
