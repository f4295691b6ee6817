pub mod damage;
pub mod snapshot;
pub mod store;
