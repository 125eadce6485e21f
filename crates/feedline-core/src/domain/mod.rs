//! Domain entities - the core business objects.

mod comment;
mod follow;
mod group;
mod post;
mod user;

pub use comment::{Comment, CommentView, NewComment};
pub use follow::Follow;
pub use group::{Group, NewGroup};
pub use post::{AuthorRef, NewPost, Post, PostChanges, PostView};
pub use user::User;
