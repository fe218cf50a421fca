use rustrict::CensorStr;

/// Validate and sanitize a player display name supplied at check-in.
/// Returns the trimmed name on success, or an error message.
pub fn validate_display_name(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("Display name cannot be empty".to_string());
    }
    if trimmed.len() > 32 {
        return Err("Display name must be 32 characters or fewer".to_string());
    }
    if trimmed.chars().any(char::is_control) {
        return Err("Display name cannot contain control characters".to_string());
    }
    if trimmed.is_inappropriate() {
        return Err("Display name contains inappropriate language".to_string());
    }
    Ok(trimmed.to_string())
}
