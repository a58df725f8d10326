// Library for tests to access modules

pub mod aggregate;
pub mod config;
pub mod consolidate;
pub mod docker_repo;
pub mod documents;
pub mod models;
pub mod ranking;
pub mod sampler;
pub mod version;
