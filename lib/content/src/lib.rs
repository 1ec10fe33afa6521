//! The study-sync content domain.
//!
//! Posts (with likes and comments) and shared resources, the ownership rules
//! that guard deleting them, storage seams (including the file upload
//! service), and the JSON views sent to the browser. Compiles for both the server and the wasm client.

pub mod error;
pub mod memory;
pub mod post;
pub mod resource;
pub mod store;
pub mod upload;
pub mod view;

pub use error::{ContentError, RepositoryError, UploadError};
pub use memory::{MemoryFileStorage, MemoryPostStore, MemoryResourceStore};
pub use post::{Comment, Post};
pub use resource::{NewResource, Resource};
pub use store::{PostStore, ResourceStore};
pub use upload::{FileStorage, StoredFile};
pub use view::{
    AuthorDirectory, AuthorSummary, CommentView, NewComment, NewPost, PostView, ResourceView,
    UNKNOWN_AUTHOR,
};
