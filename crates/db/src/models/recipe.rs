//! Recipe rows, reduced to the columns the image workflows read and write.

use mealie_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `recipes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Recipe {
    pub id: DbId,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    /// Extension of the stored image, if the database believes there is one.
    pub image: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
