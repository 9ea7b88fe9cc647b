pub mod email;
pub mod recipe_images;
pub mod reports;
pub mod site_settings;
