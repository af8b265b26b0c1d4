//! Owner-scoped item records.
//!
//! | Method | Path            | Description                |
//! |--------|-----------------|----------------------------|
//! | GET    | /api/data       | List the owner's items     |
//! | POST   | /api/data       | Create an item             |
//! | PUT    | /api/data/{id}  | Partially update an item   |
//! | DELETE | /api/data/{id}  | Delete an item             |
//!
//! Every mutation fans out a notification event after the store write.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::ItemService;
