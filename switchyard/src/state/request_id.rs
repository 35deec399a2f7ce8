//! Defines a unique id per `Request` that should be output with all logging.

use hyper::header::HeaderMap;
use log::trace;
use uuid::Uuid;

use crate::helpers::http::header::X_REQUEST_ID;
use crate::state::{FromState, State};

/// A container type for the value returned by `request_id`.
#[derive(Clone)]
pub(super) struct RequestId {
    val: String,
}

/// Generates a unique request id for this request, unless one was supplied by the client via the
/// `X-Request-ID` header.
///
/// The value is stored in `State` and is available via `request_id` thereafter.
pub(crate) fn set_request_id(state: &mut State) -> &str {
    if !state.has::<RequestId>() {
        let request_id = match HeaderMap::try_borrow_from(state)
            .and_then(|headers| headers.get(X_REQUEST_ID))
            .and_then(|value| value.to_str().ok())
        {
            Some(ex_req_id) => {
                trace!(
                    "[{}] RequestId set from external source via X-Request-ID header",
                    ex_req_id
                );
                RequestId {
                    val: ex_req_id.to_owned(),
                }
            }
            None => {
                let val = Uuid::new_v4().hyphenated().to_string();
                trace!("[{}] RequestId generated internally", val);
                RequestId { val }
            }
        };
        state.put(request_id);
    };

    request_id(state)
}

/// Returns the request id associated with the current request.
///
/// # Panics
///
/// Will panic if `State` has not been prepared for a request, which only happens when `State` is
/// built outside of this crate.
pub fn request_id(state: &State) -> &str {
    match RequestId::try_borrow_from(state) {
        Some(request_id) => &request_id.val,
        None => panic!("RequestId must be populated before application code is invoked"),
    }
}
