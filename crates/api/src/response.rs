//! Response envelope for API handlers.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// Every successful JSON response wraps its payload in this, keeping the
/// body shape uniform across endpoints:
///
/// ```ignore
/// Ok(Json(DataResponse { data: ticket }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
