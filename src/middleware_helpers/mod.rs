pub mod request_id;

pub use request_id::{
    current_request_id, http_trace_layer, request_id_middleware, scope_request_id, RequestId,
    REQUEST_ID_HEADER,
};
