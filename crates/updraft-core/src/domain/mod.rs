//! Domain entities - the core business objects.

mod post;
mod user;
mod vote;

pub use post::{NewPost, Post};
pub use user::{NewUser, User};
pub use vote::{VoteDirection, VoteOutcome, VoteTransition};
