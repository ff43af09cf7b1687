pub mod request;
pub mod routes;
pub mod state;
