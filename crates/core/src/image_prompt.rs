//! Natural-language prompts for recipe image generation.

/// How many leading ingredients are considered for the prompt.
pub const MAX_PROMPT_INGREDIENTS: usize = 5;

/// Build the image prompt for a recipe.
///
/// The first [`MAX_PROMPT_INGREDIENTS`] ingredients are considered and only
/// those with a non-empty note are named. `custom_text` is appended last.
pub fn build_recipe_image_prompt(
    name: &str,
    description: Option<&str>,
    ingredient_notes: &[Option<String>],
    custom_text: Option<&str>,
) -> String {
    let mut parts = vec![format!(
        "A high quality, professional food photography shot of {name}."
    )];

    if let Some(description) = description.map(str::trim).filter(|d| !d.is_empty()) {
        parts.push(description.to_string());
    }

    let notes: Vec<&str> = ingredient_notes
        .iter()
        .take(MAX_PROMPT_INGREDIENTS)
        .filter_map(|note| note.as_deref().map(str::trim))
        .filter(|note| !note.is_empty())
        .collect();
    if !notes.is_empty() {
        parts.push(format!("Key ingredients: {}.", notes.join(", ")));
    }

    if let Some(custom) = custom_text.map(str::trim).filter(|c| !c.is_empty()) {
        parts.push(custom.to_string());
    }

    parts.join(" ")
}
