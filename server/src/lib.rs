pub mod admin;
pub mod config;
pub mod db;
pub mod discord;
pub mod packet;
pub mod protocol;
pub mod relay;
