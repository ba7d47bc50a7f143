//! Naming policy applied to public resource names and member names.
//!
//! The model file may spell out public names explicitly; anything it leaves
//! implicit is derived from the declared type or field name through the
//! configured [`NamingConvention`].

use serde::{Deserialize, Serialize};

/// Casing convention for JSON member names and derived public names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NamingConvention {
    /// `blogPosts`
    #[default]
    #[serde(rename = "camelCase")]
    CamelCase,
    /// `BlogPosts`
    #[serde(rename = "PascalCase")]
    PascalCase,
    /// `blog-posts`
    #[serde(rename = "kebab-case")]
    KebabCase,
    /// `blog_posts`
    #[serde(rename = "snake_case")]
    SnakeCase,
    /// Names are used exactly as declared.
    #[serde(rename = "as-is")]
    AsIs,
}

impl NamingConvention {
    /// Applies the convention to a declared name.
    pub fn apply(&self, name: &str) -> String {
        if *self == Self::AsIs {
            return name.to_string();
        }

        let words = split_words(name);
        match self {
            Self::CamelCase => {
                let mut out = String::with_capacity(name.len());
                for (i, word) in words.iter().enumerate() {
                    if i == 0 {
                        out.push_str(&word.to_lowercase());
                    } else {
                        out.push_str(&capitalize_first(&word.to_lowercase()));
                    }
                }
                out
            }
            Self::PascalCase => words
                .iter()
                .map(|w| capitalize_first(&w.to_lowercase()))
                .collect(),
            Self::KebabCase => join_lower(&words, '-'),
            Self::SnakeCase => join_lower(&words, '_'),
            Self::AsIs => name.to_string(),
        }
    }

    /// Derives the public (plural) name of a resource type from its declared name.
    pub fn public_name(&self, type_name: &str) -> String {
        let words = split_words(type_name);
        match words.split_last() {
            Some((last, rest)) => {
                let mut pluralized: Vec<String> = rest.to_vec();
                pluralized.push(pluralize(last));
                self.apply(&pluralized.join("_"))
            }
            None => String::new(),
        }
    }
}

/// Splits an identifier into words on case boundaries, `_`, `-` and spaces.
fn split_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = name.chars().collect();

    for (i, &ch) in chars.iter().enumerate() {
        if ch == '_' || ch == '-' || ch == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if ch.is_uppercase() && !current.is_empty() {
            let prev_lower = chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit();
            let next_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            let prev_upper = chars[i - 1].is_uppercase();
            // "HTTPServer" splits before the "S", "blogPost" before the "P"
            if prev_lower || (prev_upper && next_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(ch);
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn join_lower(words: &[String], separator: char) -> String {
    let mut out = String::new();
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            out.push(separator);
        }
        out.push_str(&word.to_lowercase());
    }
    out
}

/// English pluralization good enough for type names.
pub fn pluralize(word: &str) -> String {
    let lower = word.to_lowercase();
    if lower.ends_with('y')
        && !lower.ends_with("ay")
        && !lower.ends_with("ey")
        && !lower.ends_with("oy")
        && !lower.ends_with("uy")
    {
        format!("{}ies", &word[..word.len() - 1])
    } else if lower.ends_with('s')
        || lower.ends_with('x')
        || lower.ends_with('z')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        format!("{word}es")
    } else {
        format!("{word}s")
    }
}

/// Capitalizes the first character of a string.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_conventions() {
        assert_eq!(NamingConvention::CamelCase.apply("BlogPost"), "blogPost");
        assert_eq!(NamingConvention::CamelCase.apply("blog_post"), "blogPost");
        assert_eq!(NamingConvention::PascalCase.apply("blog-post"), "BlogPost");
        assert_eq!(NamingConvention::KebabCase.apply("BlogPost"), "blog-post");
        assert_eq!(NamingConvention::SnakeCase.apply("BlogPost"), "blog_post");
        assert_eq!(NamingConvention::AsIs.apply("Blog_Post"), "Blog_Post");
    }

    #[test]
    fn test_acronyms() {
        assert_eq!(NamingConvention::KebabCase.apply("HTTPServer"), "http-server");
        assert_eq!(NamingConvention::CamelCase.apply("URLPath"), "urlPath");
    }

    #[test]
    fn test_public_name_derivation() {
        assert_eq!(NamingConvention::CamelCase.public_name("BlogPost"), "blogPosts");
        assert_eq!(NamingConvention::KebabCase.public_name("WorkItem"), "work-items");
        assert_eq!(NamingConvention::CamelCase.public_name("Category"), "categories");
        assert_eq!(NamingConvention::CamelCase.public_name("Address"), "addresses");
        assert_eq!(NamingConvention::CamelCase.public_name("Day"), "days");
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("Match"), "Matches");
        assert_eq!(pluralize("Order"), "Orders");
    }

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("name"), "Name");
        assert_eq!(capitalize_first(""), "");
    }

    #[test]
    fn test_deserialize_convention() {
        let c: NamingConvention = serde_json::from_str("\"kebab-case\"").unwrap();
        assert_eq!(c, NamingConvention::KebabCase);
    }
}
