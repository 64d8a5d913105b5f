pub mod handlers;
pub mod response;
pub mod routes;
pub mod session;

pub use routes::create_router;
