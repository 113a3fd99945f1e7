//! Shared constants for integration tests

// ============================================================================
// Collections
// ============================================================================

pub const POSTS_ID: &str = "pbc_1125843985";
pub const POSTS_NAME: &str = "posts";

pub const USERS_ID: &str = "_pb_users_auth_";
pub const USERS_NAME: &str = "users";

// ============================================================================
// Fields
// ============================================================================

/// The posts relation to users, named `created_by` before the rename.
pub const AUTHOR_FIELD_ID: &str = "relation3725765462";

pub const TITLE_FIELD_ID: &str = "text724990059";

/// Index of the author relation in the posts fixture.
pub const AUTHOR_POSITION: usize = 5;

pub const POSTS_FIELD_COUNT: usize = 7;

pub const UPDATED_POSTS_ID: &str = "1768235264_updated_posts";
