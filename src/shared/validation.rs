use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating file tags
    /// Lowercase alphanumeric with single hyphens or underscores inside
    /// - Valid: "q1", "budget", "q1-2025", "fiscal_year"
    /// - Invalid: "-tag", "tag-", "TAG", "tag name", ""
    pub static ref TAG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:[-_][a-z0-9]+)*$").unwrap();
}

/// Maximum number of tags a single file may carry
pub const MAX_TAGS: usize = 20;

/// Maximum length of a single tag
pub const MAX_TAG_LEN: usize = 64;

/// Validate a list of tags; returns the offending tag on failure
pub fn validate_tags(tags: &[String]) -> Result<(), String> {
    if tags.len() > MAX_TAGS {
        return Err(format!("Too many tags (max {})", MAX_TAGS));
    }
    for tag in tags {
        if tag.len() > MAX_TAG_LEN {
            return Err(format!("Tag '{}' exceeds {} characters", tag, MAX_TAG_LEN));
        }
        if !TAG_REGEX.is_match(tag) {
            return Err(format!("Invalid tag '{}'", tag));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_regex_valid() {
        assert!(TAG_REGEX.is_match("q1"));
        assert!(TAG_REGEX.is_match("budget"));
        assert!(TAG_REGEX.is_match("q1-2025"));
        assert!(TAG_REGEX.is_match("fiscal_year"));
        assert!(TAG_REGEX.is_match("a"));
    }

    #[test]
    fn test_tag_regex_invalid() {
        assert!(!TAG_REGEX.is_match("-tag")); // starts with hyphen
        assert!(!TAG_REGEX.is_match("tag-")); // ends with hyphen
        assert!(!TAG_REGEX.is_match("TAG")); // uppercase
        assert!(!TAG_REGEX.is_match("tag name")); // space
        assert!(!TAG_REGEX.is_match("")); // empty
    }

    #[test]
    fn test_validate_tags() {
        assert!(validate_tags(&["q1".to_string(), "budget".to_string()]).is_ok());
        assert!(validate_tags(&["Bad Tag".to_string()]).is_err());

        let too_many: Vec<String> = (0..MAX_TAGS + 1).map(|i| format!("tag{}", i)).collect();
        assert!(validate_tags(&too_many).is_err());
    }
}
