pub mod error_handler;
pub mod request_id;

pub use error_handler::{error_handler_middleware, ErrorHandlerState};
pub use request_id::{get_request_id, request_id_middleware, RequestId};
