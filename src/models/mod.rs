//! Data models
//!
//! - `Section`: the editable parts of the landing page
//! - `UserProfile` / `Role`: account data issued by the backend
//! - `Session`: the signed-in session record

mod section;
mod session;
mod user;

pub use section::{ImageUpload, Section, UnknownSection};
pub use session::Session;
pub use user::{Role, UserId, UserProfile};
