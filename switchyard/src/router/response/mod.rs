//! Defines `Router` functionality which acts on the `Response`

mod extender;
mod finalizer;

pub use self::extender::*;
pub use self::finalizer::*;
