pub mod abi;
pub mod clone;
pub mod create2;
pub mod keyless;
