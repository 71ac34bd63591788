pub mod artifact;
pub mod config_wrapper;
pub mod deploy_config;
pub mod deployment_group;
pub mod fee;
pub mod metadata;
pub mod precomputed;
pub mod request;
pub mod transaction;
