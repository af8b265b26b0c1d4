//! Registration, login and bearer-token verification.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Auth | Description |
//! |--------|----------|------|-------------|
//! | POST | `/api/auth/register` | No | Register, returns token + user |
//! | POST | `/api/auth/login` | No | Login, returns token + user |
//! | GET | `/api/auth/me` | Yes | Current user |

pub mod dtos;
pub mod handlers;
pub mod model;
pub mod models;
pub mod routes;
pub mod services;

pub use services::{AuthService, TokenService};
