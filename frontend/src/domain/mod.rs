//! Domain core: registration and rating workflows behind driven ports.
//!
//! Nothing in here performs I/O directly. Remote collaborators are reached
//! through the traits in [`ports`], and the signed-in user arrives as an
//! injected [`Session`].

pub mod auth;
pub mod error;
pub mod ports;
pub mod rating;
pub mod registration;
pub mod session;
pub mod trace_id;

pub use self::auth::{JUST_REGISTERED_NOTICE, LoginPrefill};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::session::{Session, SessionUser, UserId, UserIdValidationError};
pub use self::trace_id::TraceId;
