//! Prompt templates addressed with dot notation.
//!
//! `recipes.parse-recipe-ingredients` resolves to
//! `recipes/parse-recipe-ingredients.txt`, looked up first in the optional
//! override directory and then among the templates compiled into the binary.

use std::path::{Path, PathBuf};

use crate::error::AiError;
use crate::types::DataInjection;

/// Templates shipped with the crate, keyed by dotted name.
static BUNDLED: &[(&str, &str)] = &[
    (
        "recipes.parse-recipe-image",
        include_str!("../prompts/recipes/parse-recipe-image.txt"),
    ),
    (
        "recipes.parse-recipe-ingredients",
        include_str!("../prompts/recipes/parse-recipe-ingredients.txt"),
    ),
    (
        "recipes.scrape-recipe",
        include_str!("../prompts/recipes/scrape-recipe.txt"),
    ),
    (
        "recipes.suggest-recipe-tags",
        include_str!("../prompts/recipes/suggest-recipe-tags.txt"),
    ),
];

/// Validate a dotted name and map it to a relative template path.
fn relative_path(name: &str) -> Result<PathBuf, AiError> {
    if name.is_empty() {
        return Err(AiError::EmptyPromptName);
    }
    let segments: Vec<&str> = name.split('.').collect();
    let invalid = segments
        .iter()
        .any(|s| s.is_empty() || s.contains('/') || s.contains('\\'));
    if invalid {
        return Err(AiError::InvalidPromptName(name.to_string()));
    }

    let (file, dirs) = segments
        .split_last()
        .ok_or_else(|| AiError::InvalidPromptName(name.to_string()))?;
    let mut path: PathBuf = dirs.iter().collect();
    path.push(format!("{file}.txt"));
    Ok(path)
}

/// Loads prompt templates and appends data injections to them.
#[derive(Debug, Clone, Default)]
pub struct PromptLibrary {
    overrides: Option<PathBuf>,
}

impl PromptLibrary {
    /// Library backed by the bundled templates, with `overrides` consulted
    /// first when set.
    pub fn new(overrides: Option<PathBuf>) -> Self {
        Self { overrides }
    }

    async fn load(&self, name: &str, relative: &Path) -> Result<String, AiError> {
        if let Some(dir) = &self.overrides {
            match tokio::fs::read_to_string(dir.join(relative)).await {
                Ok(content) => return Ok(content),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(AiError::PromptNotFound {
                        name: name.to_string(),
                        source,
                    })
                }
            }
        }

        BUNDLED
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, content)| content.to_string())
            .ok_or_else(|| AiError::PromptNotFound {
                name: name.to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no template at {}", relative.display()),
                ),
            })
    }

    /// Load a template and append each injection as a delimited block.
    pub async fn get_prompt(
        &self,
        name: &str,
        injections: &[DataInjection],
    ) -> Result<String, AiError> {
        let relative = relative_path(name)?;
        let content = self.load(name, &relative).await?;
        Ok(render(content, injections))
    }
}

fn render(template: String, injections: &[DataInjection]) -> String {
    if injections.is_empty() {
        return template;
    }
    let mut parts = Vec::with_capacity(injections.len() + 1);
    parts.push(template);
    parts.extend(injections.iter().map(|injection| {
        format!(
            "\n###\n{}\n---\n\n{}\n",
            injection.description, injection.value
        )
    }));
    parts.join("\n")
}
