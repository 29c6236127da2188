//! `x-request-id` handling for the HTTP stack.

use tower::layer::util::Stack;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

/// Header carrying the request identifier.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request-id layers as one unit: a UUID is assigned to requests that arrive
/// without one, and the identifier is echoed on the response.
pub type RequestIdLayers = Stack<PropagateRequestIdLayer, SetRequestIdLayer<MakeRequestUuid>>;

/// Build [`RequestIdLayers`]. The setter is outermost, so inner layers and the
/// response see the same identifier.
#[must_use]
pub fn request_id_layers() -> RequestIdLayers {
    Stack::new(
        PropagateRequestIdLayer::x_request_id(),
        SetRequestIdLayer::x_request_id(MakeRequestUuid),
    )
}
