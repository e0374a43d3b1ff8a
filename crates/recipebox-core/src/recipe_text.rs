//! Recipe text block codec.
//!
//! A recipe is edited as a plain text block with three labelled sections:
//!
//! ```text
//! Recipe Name: Chili
//!
//! Ingredients:
//! beans
//! meat
//!
//! Instructions:
//! cook
//! serve
//! ```
//!
//! [`render`] produces that block from structured fields and [`parse`] reads
//! it back. Markers are matched case-insensitively anywhere on a line. The
//! parser strips a leading `-` bullet from ingredient lines and a leading
//! `<digits>.` marker from instruction lines, for both new and edited recipes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const NAME_MARKER: &str = "recipe name:";
const INGREDIENTS_MARKER: &str = "ingredients:";
const INSTRUCTIONS_MARKER: &str = "instructions:";

/// Text pre-filled into the editor when adding a new recipe.
pub const NEW_RECIPE_TEMPLATE: &str = "Recipe Name: \n\nIngredients:\n- \n\nInstructions:\n1. ";

/// The three user-editable fields of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeFields {
    pub name: String,
    pub ingredients: String,
    pub instructions: String,
}

/// Reasons a text block cannot be turned into [`RecipeFields`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecipeTextError {
    #[error("Include \"Recipe Name:\" in your recipe")]
    MissingNameSection,

    #[error("Enter a recipe name after \"Recipe Name:\"")]
    EmptyName,

    #[error("Include both Ingredients and Instructions sections in order")]
    MissingOrMisorderedSections,
}

/// Render recipe fields as an editable text block.
pub fn render(recipe: &RecipeFields) -> String {
    format!(
        "Recipe Name: {}\n\nIngredients:\n{}\n\nInstructions:\n{}",
        recipe.name, recipe.ingredients, recipe.instructions
    )
}

/// Parse an edited text block back into recipe fields.
pub fn parse(text: &str) -> Result<RecipeFields, RecipeTextError> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();

    let name_idx = find_marker(&lines, NAME_MARKER, None)
        .ok_or(RecipeTextError::MissingNameSection)?;
    let name = lines[name_idx]
        .split_once(':')
        .map(|(_, value)| value.trim())
        .unwrap_or_default();
    if name.is_empty() {
        return Err(RecipeTextError::EmptyName);
    }

    let ingredients_idx = find_marker(&lines, INGREDIENTS_MARKER, Some(name_idx));
    let instructions_idx = find_marker(&lines, INSTRUCTIONS_MARKER, Some(name_idx));
    let (Some(ingredients_idx), Some(instructions_idx)) = (ingredients_idx, instructions_idx)
    else {
        return Err(RecipeTextError::MissingOrMisorderedSections);
    };
    if ingredients_idx >= instructions_idx {
        return Err(RecipeTextError::MissingOrMisorderedSections);
    }

    let ingredients = join_stripped(&lines[ingredients_idx + 1..instructions_idx], strip_bullet);
    let instructions = join_stripped(&lines[instructions_idx + 1..], strip_numbering);

    Ok(RecipeFields {
        name: name.to_string(),
        ingredients,
        instructions,
    })
}

fn find_marker(lines: &[&str], marker: &str, skip: Option<usize>) -> Option<usize> {
    lines
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != skip)
        .find(|(_, line)| line.to_lowercase().contains(marker))
        .map(|(i, _)| i)
}

/// Strip each line's marker and drop lines left empty, so a bare `-` or
/// `3.` placeholder contributes nothing.
fn join_stripped(lines: &[&str], strip: fn(&str) -> &str) -> String {
    lines
        .iter()
        .map(|line| strip(line))
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// `- flour` -> `flour`
fn strip_bullet(line: &str) -> &str {
    line.strip_prefix('-').map_or(line, str::trim_start)
}

/// `12. stir` -> `stir`
fn strip_numbering(line: &str) -> &str {
    let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() == line.len() {
        return line;
    }
    rest.strip_prefix('.').map_or(line, str::trim_start)
}
