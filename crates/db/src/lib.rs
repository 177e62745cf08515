pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect_with_settings, DbPool};
pub use fixtures::{sample_profile, seed_demo_clients, SeedResult};
pub use repositories::{
    client_count, ClientRepository, InMemoryClientRepository, RepositoryError,
    SqlClientRepository,
};
