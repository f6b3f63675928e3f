pub mod article;
pub mod comment;
pub mod models;
pub mod routes;
pub mod vote;
