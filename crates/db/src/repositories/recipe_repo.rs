//! Repository for the `recipes` and `recipe_ingredients` tables.

use mealie_core::types::DbId;
use sqlx::PgPool;

use crate::models::recipe::Recipe;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, slug, name, description, image, created_at, updated_at";

/// Provides the recipe reads and image updates used by image generation.
pub struct RecipeRepo;

impl RecipeRepo {
    /// List every recipe, oldest first.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Recipe>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM recipes ORDER BY id");
        sqlx::query_as::<_, Recipe>(&query).fetch_all(pool).await
    }

    /// Find a recipe by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Recipe>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM recipes WHERE id = $1");
        sqlx::query_as::<_, Recipe>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a recipe by slug.
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Recipe>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM recipes WHERE slug = $1");
        sqlx::query_as::<_, Recipe>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Ingredient notes for a recipe, in display order.
    pub async fn list_ingredient_notes(
        pool: &PgPool,
        recipe_id: DbId,
    ) -> Result<Vec<Option<String>>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<String>>(
            "SELECT note FROM recipe_ingredients
             WHERE recipe_id = $1
             ORDER BY position, id",
        )
        .bind(recipe_id)
        .fetch_all(pool)
        .await
    }

    /// Record the stored image extension for a recipe. Returns `true` if a
    /// row was updated.
    pub async fn update_image(
        pool: &PgPool,
        recipe_id: DbId,
        image: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE recipes SET image = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(recipe_id)
        .bind(image)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
