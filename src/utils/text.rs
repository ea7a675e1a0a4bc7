// src/utils/text.rs
use once_cell::sync::Lazy;
use regex::Regex;

// Labeler-product(-package) with dashes, or the bare 10/11 digit forms.
static NDC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d{4,5}-\d{3,4}(?:-\d{1,2})?|\d{10,11})$")
        .expect("Failed to compile NDC_RE")
});

static SET_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("Failed to compile SET_ID_RE")
});

/// Trims and collapses every run of whitespace to a single space.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case-insensitive substring match.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Case-insensitive SQL `LIKE '%q%'` matcher: `%` matches any run of
/// characters and `_` exactly one, everything else is literal.
pub struct LikePattern {
    needle: String,
    re: Option<Regex>,
}

impl LikePattern {
    pub fn new(query: &str) -> Self {
        let mut pattern = String::from("(?is)");
        let mut literal = String::new();
        for c in query.chars() {
            match c {
                '%' | '_' => {
                    pattern.push_str(&regex::escape(&literal));
                    literal.clear();
                    pattern.push_str(if c == '%' { ".*" } else { "." });
                }
                _ => literal.push(c),
            }
        }
        pattern.push_str(&regex::escape(&literal));

        let re = match Regex::new(&pattern) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!("Falling back to substring search for '{}': {}", query, e);
                None
            }
        };
        Self { needle: query.to_string(), re }
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        match &self.re {
            Some(re) => re.is_match(haystack),
            None => contains_ignore_case(haystack, &self.needle),
        }
    }
}

pub fn is_valid_ndc(ndc: &str) -> bool {
    NDC_RE.is_match(ndc.trim())
}

pub fn is_valid_set_id(set_id: &str) -> bool {
    SET_ID_RE.is_match(set_id.trim())
}
