//! File upload, search and download.
//!
//! | Method | Path                          | Description                      |
//! |--------|-------------------------------|----------------------------------|
//! | POST   | /api/upload                   | Multipart upload with metadata   |
//! | GET    | /api/files                    | List the owner's files           |
//! | GET    | /api/files/search/tags        | Array-overlap tag search         |
//! | GET    | /api/files/search/metadata    | JSONB containment search         |
//! | GET    | /api/files/search/content     | Substring search over text files |
//! | PUT    | /api/files/{id}/metadata      | Amend metadata and/or tags       |
//! | GET    | /api/files/{filename}         | Owner-scoped download            |
//!
//! Bytes live on local disk; the record, extracted text and tags live in
//! the store. Uploads and metadata amendments fan out notification events.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::FileService;
