pub mod clone_factory;
pub mod deployer;
