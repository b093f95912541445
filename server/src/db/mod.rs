pub mod entity;
pub mod models;
pub mod pool;
pub mod queries;
