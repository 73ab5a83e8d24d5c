#[macro_use]
extern crate tracing;

pub mod auth;
pub mod error;
pub mod handlers;
pub mod router;
#[cfg(test)]
mod test_helpers;

pub use router::{
    create_router,
    AppState,
};
