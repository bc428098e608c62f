pub mod assistant;
pub mod auth;
pub mod books;
pub mod cart;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::{ErrorResponse, SuccessResponse};
pub use routes::create_router;
