//! Schema.org recipe extraction
//!
//! Recipes are read from `<script type="application/ld+json">` blocks and
//! normalized to a flat record with stable field names.

use crate::recipe::RecipeRecord;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::OnceLock;
use thiserror::Error;
use url::Url;

/// Why a page produced no recipe
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("No recipe schema found")]
    NoRecipe,

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Website {0} is not supported")]
    Unsupported(String),
}

/// Turns page HTML into a recipe record
pub trait RecipeExtractor: Send + Sync {
    /// Whether the extractor has dedicated support for the site
    fn supports_site(&self, homepage: &str) -> bool;

    /// Extracts the recipe on a page
    ///
    /// With `supported_only`, pages of sites without dedicated support fail
    /// with [`ExtractError::Unsupported`] instead of a best-effort attempt.
    fn extract(
        &self,
        html: &str,
        url: &str,
        supported_only: bool,
    ) -> Result<RecipeRecord, ExtractError>;
}

/// Extracts recipes from schema.org JSON-LD markup
#[derive(Debug, Clone, Default)]
pub struct JsonLdExtractor {
    supported_hosts: HashSet<String>,
}

impl JsonLdExtractor {
    pub fn new<I, S>(supported_hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            supported_hosts: supported_hosts
                .into_iter()
                .map(|h| normalize_host(h.as_ref()))
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }
}

impl RecipeExtractor for JsonLdExtractor {
    fn supports_site(&self, homepage: &str) -> bool {
        host_of(homepage)
            .map(|host| self.supported_hosts.contains(&normalize_host(&host)))
            .unwrap_or(false)
    }

    fn extract(
        &self,
        html: &str,
        url: &str,
        supported_only: bool,
    ) -> Result<RecipeRecord, ExtractError> {
        if supported_only && !self.supports_site(url) {
            return Err(ExtractError::Unsupported(
                host_of(url).unwrap_or_else(|| url.to_string()),
            ));
        }

        let document = Html::parse_document(html);
        let recipe = find_recipe(&document).ok_or(ExtractError::NoRecipe)?;
        build_record(&recipe, &document, url)
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().to_lowercase();
    host.strip_prefix("www.").unwrap_or(&host).to_string()
}

fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

fn select_first_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(clean_text)
        .filter(|s| !s.is_empty())
}

/// First schema.org Recipe object found in the page's JSON-LD blocks
fn find_recipe(document: &Html) -> Option<Value> {
    let selector = Selector::parse("script[type='application/ld+json']").ok()?;

    for element in document.select(&selector) {
        let text = element.inner_html();
        let Ok(json) = serde_json::from_str::<Value>(text.trim()) else {
            continue;
        };
        if let Some(recipe) = find_recipe_in_json(&json) {
            return Some(recipe.clone());
        }
    }
    None
}

/// Recursively searches for a Recipe object, including `@graph` arrays
fn find_recipe_in_json(json: &Value) -> Option<&Value> {
    match json {
        Value::Object(obj) => {
            if obj.get("@type").map(is_recipe_type).unwrap_or(false) {
                return Some(json);
            }
            if let Some(recipe) = obj.get("@graph").and_then(find_recipe_in_json) {
                return Some(recipe);
            }
            obj.values().find_map(find_recipe_in_json)
        }
        Value::Array(items) => items.iter().find_map(find_recipe_in_json),
        _ => None,
    }
}

fn is_recipe_type(value: &Value) -> bool {
    match value {
        Value::String(s) => s == "Recipe",
        Value::Array(types) => types.iter().any(|t| t == "Recipe"),
        _ => false,
    }
}

fn build_record(recipe: &Value, document: &Html, url: &str) -> Result<RecipeRecord, ExtractError> {
    let title = recipe
        .get("name")
        .and_then(text_value)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ExtractError::MissingField("title".to_string()))?;

    let mut record = RecipeRecord::new();
    record.insert("title", title);

    let mut optional = |field: &str, value: Option<Value>| {
        if let Some(value) = value {
            record.insert(field, value);
        }
    };

    optional("author", recipe.get("author").and_then(names).map(Value::from));
    optional(
        "canonical_url",
        recipe
            .get("url")
            .or_else(|| recipe.get("mainEntityOfPage"))
            .and_then(link_value)
            .or_else(|| select_first_attr(document, "link[rel='canonical']", "href"))
            .or_else(|| Some(url.to_string()))
            .map(Value::from),
    );
    optional(
        "site_name",
        select_first_attr(document, "meta[property='og:site_name']", "content").map(Value::from),
    );
    optional("host", host_of(url).map(Value::from));
    optional(
        "language",
        select_first_attr(document, "html", "lang")
            .or_else(|| recipe.get("inLanguage").and_then(text_value))
            .map(Value::from),
    );
    optional(
        "description",
        recipe.get("description").and_then(text_value).map(Value::from),
    );
    optional("image", recipe.get("image").and_then(image_value).map(Value::from));

    let ingredients = recipe
        .get("recipeIngredient")
        .or_else(|| recipe.get("ingredients"))
        .map(string_list)
        .unwrap_or_default();
    if !ingredients.is_empty() {
        optional(
            "ingredient_groups",
            Some(json!([{ "ingredients": ingredients.clone(), "purpose": null }])),
        );
        optional("ingredients", Some(Value::from(ingredients)));
    }

    let steps = recipe
        .get("recipeInstructions")
        .map(instruction_steps)
        .unwrap_or_default();
    if !steps.is_empty() {
        optional("instructions", Some(Value::from(steps.join("\n"))));
        optional("instructions_list", Some(Value::from(steps)));
    }

    optional(
        "category",
        recipe.get("recipeCategory").and_then(joined).map(Value::from),
    );
    optional(
        "cuisine",
        recipe.get("recipeCuisine").and_then(joined).map(Value::from),
    );
    optional("keywords", recipe.get("keywords").and_then(keywords).map(Value::from));
    optional("yields", recipe.get("recipeYield").and_then(yields).map(Value::from));

    for (field, key) in [
        ("total_time", "totalTime"),
        ("cook_time", "cookTime"),
        ("prep_time", "prepTime"),
    ] {
        optional(field, recipe.get(key).and_then(minutes).map(Value::from));
    }

    if let Some(rating) = recipe.get("aggregateRating") {
        optional("ratings", rating.get("ratingValue").and_then(number).map(|r| {
            Value::from((r * 100.0).round() / 100.0)
        }));
        optional(
            "ratings_count",
            rating
                .get("ratingCount")
                .or_else(|| rating.get("reviewCount"))
                .and_then(number)
                .map(|c| Value::from(c as u64)),
        );
    }

    optional(
        "nutrients",
        recipe.get("nutrition").and_then(nutrients).map(Value::Object),
    );

    Ok(record)
}

fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(clean_text(s)),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => items.iter().find_map(text_value),
        _ => None,
    }
}

fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(text_value)
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => s
            .lines()
            .map(clean_text)
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn names(value: &Value) -> Option<String> {
    let names: Vec<String> = match value {
        Value::Array(items) => items.iter().filter_map(names).collect(),
        Value::Object(obj) => obj.get("name").and_then(text_value).into_iter().collect(),
        other => text_value(other).into_iter().collect(),
    };
    let names: Vec<String> = names.into_iter().filter(|n| !n.is_empty()).collect();
    (!names.is_empty()).then(|| names.join(", "))
}

fn link_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.starts_with("http") => Some(s.trim().to_string()),
        Value::Object(obj) => obj.get("@id").or_else(|| obj.get("url")).and_then(link_value),
        _ => None,
    }
}

fn image_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Array(items) => items.iter().find_map(image_value),
        Value::Object(obj) => obj.get("url").or_else(|| obj.get("@id")).and_then(image_value),
        _ => None,
    }
}

fn instruction_steps(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => string_list(&Value::String(s.clone())),
        Value::Array(items) => items.iter().flat_map(instruction_steps).collect(),
        Value::Object(obj) => {
            if let Some(items) = obj.get("itemListElement") {
                return instruction_steps(items);
            }
            obj.get("text")
                .or_else(|| obj.get("name"))
                .and_then(text_value)
                .filter(|s| !s.is_empty())
                .into_iter()
                .collect()
        }
        _ => Vec::new(),
    }
}

fn joined(value: &Value) -> Option<String> {
    let parts = string_list(value);
    (!parts.is_empty()).then(|| parts.join(", "))
}

fn keywords(value: &Value) -> Option<Vec<String>> {
    let mut seen = HashSet::new();
    let parts: Vec<String> = match value {
        Value::String(s) => s.split(',').map(clean_text).collect(),
        other => string_list(other),
    };
    let parts: Vec<String> = parts
        .into_iter()
        .filter(|k| !k.is_empty() && seen.insert(k.to_lowercase()))
        .collect();
    (!parts.is_empty()).then_some(parts)
}

fn yields(value: &Value) -> Option<String> {
    let text = match value {
        Value::Array(items) => return items.iter().find_map(yields),
        Value::Number(n) => n.to_string(),
        Value::String(s) => clean_text(s),
        _ => return None,
    };
    if text.is_empty() {
        return None;
    }
    match text.parse::<u32>() {
        Ok(1) => Some("1 serving".to_string()),
        Ok(n) => Some(format!("{} servings", n)),
        Err(_) => Some(text),
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

fn minutes(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => parse_duration_minutes(s),
        _ => None,
    }
}

fn duration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)^P(?:(\d+)D)?(?:T(?:(\d+(?:\.\d+)?)H)?(?:(\d+(?:\.\d+)?)M)?(?:(\d+(?:\.\d+)?)S)?)?$",
        )
        .expect("duration pattern is valid")
    })
}

/// Converts an ISO-8601 duration such as `PT1H30M` to whole minutes
///
/// Plain integers are taken as minutes already.
pub fn parse_duration_minutes(duration: &str) -> Option<u64> {
    let duration = duration.trim();
    if let Ok(minutes) = duration.parse::<u64>() {
        return Some(minutes);
    }

    let caps = duration_pattern().captures(duration)?;
    if caps.iter().skip(1).all(|c| c.is_none()) {
        return None;
    }

    let part = |i: usize| -> f64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0)
    };
    let total = part(1) * 24.0 * 60.0 + part(2) * 60.0 + part(3) + part(4) / 60.0;
    Some(total.round() as u64)
}

fn nutrients(value: &Value) -> Option<Map<String, Value>> {
    let obj = value.as_object()?;
    let nutrients: Map<String, Value> = obj
        .iter()
        .filter(|(key, _)| !key.starts_with('@'))
        .filter_map(|(key, v)| text_value(v).map(|text| (key.clone(), Value::from(text))))
        .filter(|(_, v)| v.as_str().map(|s| !s.is_empty()).unwrap_or(false))
        .collect();
    (!nutrients.is_empty()).then_some(nutrients)
}
