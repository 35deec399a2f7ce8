//! Defines types for passing request state through filters and handlers.

mod data;
mod from_state;
mod params;
pub mod request_id;

use std::any::{Any, TypeId};
use std::collections::HashMap;

use hyper::{Body, Request};
use log::trace;

use crate::helpers::http::request::path::RequestPathSegments;

pub use crate::state::data::StateData;
pub use crate::state::from_state::FromState;
pub use crate::state::params::Params;
pub use crate::state::request_id::request_id;

pub(crate) use crate::state::request_id::set_request_id;

/// Provides storage for request state, and stores one item of each type. The types used for
/// storage must implement the `switchyard::state::StateData` trait to allow its storage.
///
/// `State` is the opaque request context of this crate: routing writes the captured path
/// parameters into its `Params`, filters and handlers read and write anything else they need.
///
/// # Examples
///
/// ```rust
/// use switchyard::state::{State, StateData};
///
/// struct MyStruct {
///   value: i32
/// }
///
/// impl StateData for MyStruct {}
///
/// # fn main() {
/// #   State::with_new(|state| {
/// #
/// state.put(MyStruct { value: 1 });
/// assert_eq!(state.borrow::<MyStruct>().value, 1);
/// #
/// #   });
/// # }
/// ```
pub struct State {
    data: HashMap<TypeId, Box<dyn Any + Send>>,
}

impl State {
    /// Creates a new, empty `State` container. This is for internal use, because the
    /// ability to create a new `State` container would allow for libraries and applications to
    /// incorrectly discard important internal data.
    pub(crate) fn new() -> State {
        State {
            data: HashMap::new(),
        }
    }

    /// Creates a new, empty `State` and yields it mutably into the provided closure. This is
    /// intended only for use in the documentation tests for `State`, since the `State` container
    /// cannot be constructed otherwise.
    #[doc(hidden)]
    pub fn with_new<F>(f: F)
    where
        F: FnOnce(&mut State),
    {
        f(&mut State::new())
    }

    /// Builds the `State` for a single request from its hyper representation.
    ///
    /// Every part of the request is stored individually, the path is split into decoded segments,
    /// an empty `Params` store is added and a request id is assigned.
    pub fn from_request(req: Request<Body>) -> State {
        let mut state = State::new();
        let (parts, body) = req.into_parts();

        state.put(RequestPathSegments::new(parts.uri.path()));
        state.put(Params::new());
        state.put(parts.method);
        state.put(parts.uri);
        state.put(parts.version);
        state.put(parts.headers);
        state.put(body);
        set_request_id(&mut state);

        state
    }

    /// Puts a value into the `State` storage. One value of each type is retained. Successive calls
    /// to `put` will overwrite the existing value of the same type.
    pub fn put<T>(&mut self, t: T)
    where
        T: StateData,
    {
        let type_id = TypeId::of::<T>();
        trace!(" inserting record to state for type_id `{:?}`", type_id);
        self.data.insert(type_id, Box::new(t));
    }

    /// Determines if the current value exists in `State` storage.
    pub fn has<T>(&self) -> bool
    where
        T: StateData,
    {
        let type_id = TypeId::of::<T>();
        self.data.get(&type_id).is_some()
    }

    /// Tries to borrow a value from the `State` storage.
    pub fn try_borrow<T>(&self) -> Option<&T>
    where
        T: StateData,
    {
        let type_id = TypeId::of::<T>();
        trace!(" borrowing state data for type_id `{:?}`", type_id);
        self.data.get(&type_id).and_then(|b| b.downcast_ref::<T>())
    }

    /// Borrows a value from the `State` storage.
    ///
    /// # Panics
    ///
    /// If a value of type `T` is not present in `State`.
    pub fn borrow<T>(&self) -> &T
    where
        T: StateData,
    {
        self.try_borrow()
            .expect("required type is not present in State container")
    }

    /// Tries to mutably borrow a value from the `State` storage.
    pub fn try_borrow_mut<T>(&mut self) -> Option<&mut T>
    where
        T: StateData,
    {
        let type_id = TypeId::of::<T>();
        trace!(" mutably borrowing state data for type_id `{:?}`", type_id);
        self.data
            .get_mut(&type_id)
            .and_then(|b| b.downcast_mut::<T>())
    }

    /// Mutably borrows a value from the `State` storage.
    ///
    /// # Panics
    ///
    /// If a value of type `T` is not present in `State`.
    pub fn borrow_mut<T>(&mut self) -> &mut T
    where
        T: StateData,
    {
        self.try_borrow_mut()
            .expect("required type is not present in State container")
    }

    /// Tries to move a value out of the `State` storage and return ownership.
    pub fn try_take<T>(&mut self) -> Option<T>
    where
        T: StateData,
    {
        let type_id = TypeId::of::<T>();
        trace!(
            " taking ownership from state data for type_id `{:?}`",
            type_id
        );
        self.data
            .remove(&type_id)
            .and_then(|b| b.downcast::<T>().ok())
            .map(|b| *b)
    }

    /// Moves a value out of the `State` storage and returns ownership.
    ///
    /// # Panics
    ///
    /// If a value of type `T` is not present in `State`.
    pub fn take<T>(&mut self) -> T
    where
        T: StateData,
    {
        self.try_take()
            .expect("required type is not present in State container")
    }

    /// Mutable access to the path parameter store, created on first use.
    pub fn params_mut(&mut self) -> &mut Params {
        if !self.has::<Params>() {
            self.put(Params::new());
        }
        self.borrow_mut::<Params>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use hyper::{Method, Uri};

    struct Counter(usize);
    impl StateData for Counter {}

    #[test]
    fn put_overwrites_same_type() {
        State::with_new(|state| {
            state.put(Counter(1));
            state.put(Counter(2));
            assert_eq!(state.borrow::<Counter>().0, 2);
            assert_eq!(state.take::<Counter>().0, 2);
            assert!(!state.has::<Counter>());
        });
    }

    #[test]
    fn from_request_populates_request_parts() {
        let req = Request::builder()
            .method(Method::PUT)
            .uri("http://localhost/users/%7Ebob/")
            .header("X-Request-ID", "abc-123")
            .body(Body::empty())
            .unwrap();

        let state = State::from_request(req);

        assert_eq!(state.borrow::<Method>(), &Method::PUT);
        assert_eq!(state.borrow::<Uri>().path(), "/users/%7Ebob/");
        assert_eq!(
            state.borrow::<RequestPathSegments>().as_strs(),
            vec!["users", "~bob"]
        );
        assert!(state.borrow::<Params>().is_empty());
        assert_eq!(request_id(&state), "abc-123");
    }

    #[test]
    fn params_mut_creates_store() {
        State::with_new(|state| {
            state.params_mut().set("id", "1");
            assert_eq!(state.borrow::<Params>().get("id"), Some("1"));
        });
    }
}
