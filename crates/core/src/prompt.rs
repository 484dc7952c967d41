//! Prompt sent alongside the sofa and fabric images.

/// Base instruction for the image model.
pub const BASE_PROMPT: &str = "A photorealistic sofa with the exact fabric pattern and texture \
from the reference image applied seamlessly to its upholstery. The sofa should maintain its \
original shape and lighting while the fabric covers all cushions and surfaces naturally. \
High quality, professional furniture photography.";

/// Build the generation prompt, appending user-supplied details verbatim
/// (trimmed) when they are not blank.
pub fn build_prompt(user_details: Option<&str>) -> String {
    match user_details.map(str::trim).filter(|d| !d.is_empty()) {
        Some(details) => format!("{BASE_PROMPT} Additional details: {details}."),
        None => BASE_PROMPT.to_string(),
    }
}
