//! Recipe queries.

use recipebox_core::db::{DatabaseError, unix_timestamp};

use super::db::RecipeDatabase;
use super::models::{Recipe, RecipeName};

/// Parameters for creating or replacing a recipe.
pub struct RecipeParams<'a> {
    pub name: &'a str,
    pub ingredients: &'a str,
    pub instructions: &'a str,
}

impl RecipeDatabase {
    /// Insert a recipe. A taken name surfaces as `DatabaseError::Duplicate`.
    pub async fn create_recipe(
        &self,
        id: &str,
        params: &RecipeParams<'_>,
        created_by: Option<&str>,
    ) -> Result<Recipe, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO recipes (id, name, ingredients, instructions, created_by, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(params.name)
        .bind(params.ingredients)
        .bind(params.instructions)
        .bind(created_by)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_recipe(id).await
    }

    /// Get a recipe by ID.
    pub async fn get_recipe(&self, id: &str) -> Result<Recipe, DatabaseError> {
        sqlx::query_as::<_, Recipe>("SELECT * FROM recipes WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Recipe {id}")))
    }

    /// `{id, name}` of every recipe, ordered by name.
    pub async fn list_recipe_names(&self) -> Result<Vec<RecipeName>, DatabaseError> {
        let names =
            sqlx::query_as::<_, RecipeName>("SELECT id, name FROM recipes ORDER BY name COLLATE NOCASE")
                .fetch_all(self.pool())
                .await?;

        Ok(names)
    }

    /// Case-insensitive substring search on recipe names, ordered by name.
    ///
    /// Matching uses Unicode case folding, which `SQLite`'s `lower()` lacks,
    /// so it runs over the name index. Zero matches is
    /// `DatabaseError::NotFound`.
    pub async fn search_recipes(&self, term: &str) -> Result<Vec<Recipe>, DatabaseError> {
        let needle = term.to_lowercase();
        let mut recipes = Vec::new();
        for entry in self.list_recipe_names().await? {
            if entry.name.to_lowercase().contains(&needle) {
                recipes.push(self.get_recipe(&entry.id).await?);
            }
        }

        if recipes.is_empty() {
            return Err(DatabaseError::NotFound(format!("Recipes matching {term:?}")));
        }
        Ok(recipes)
    }

    /// Replace name, ingredients and instructions of an existing recipe.
    pub async fn update_recipe(
        &self,
        id: &str,
        params: &RecipeParams<'_>,
    ) -> Result<Recipe, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query(
            "UPDATE recipes SET name = ?, ingredients = ?, instructions = ?, updated_at = ? WHERE id = ?",
        )
        .bind(params.name)
        .bind(params.ingredients)
        .bind(params.instructions)
        .bind(now)
        .bind(id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Recipe {id}")));
        }
        self.get_recipe(id).await
    }

    /// Remove a recipe. Removing a missing ID is `DatabaseError::NotFound`.
    pub async fn delete_recipe(&self, id: &str) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Recipe {id}")));
        }
        Ok(())
    }
}
