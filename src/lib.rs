pub mod basin;
pub mod cube;
pub mod docs;
pub mod error;
pub mod grid;
pub mod upsert;
