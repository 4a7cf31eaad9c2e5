//! Slugs
//!
//! URL slugs are ASCII `a-z0-9` words joined by single dashes. Titles are
//! mostly Russian, so Cyrillic letters are transliterated before anything
//! else is replaced by a dash.

use crate::error::{CmsError, CmsResult};

pub const SLUG_MAX: usize = 80;

/// Latin spelling of a lowercase Cyrillic letter
fn transliterate(c: char) -> Option<&'static str> {
    let latin = match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' | 'ґ' => "g",
        'д' => "d",
        'е' | 'э' => "e",
        'ё' => "yo",
        'є' => "ye",
        'ж' => "zh",
        'з' => "z",
        'и' | 'і' => "i",
        'ї' => "yi",
        'й' | 'ы' => "y",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "kh",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "shch",
        'ъ' | 'ь' => "",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    };
    Some(latin)
}

/// Slug for a title, or `None` when nothing usable is left
pub fn slugify(input: &str) -> Option<String> {
    let mut out = String::new();
    let mut last_dash = true;

    for ch in input.chars().flat_map(char::to_lowercase) {
        if let Some(latin) = transliterate(ch) {
            if !latin.is_empty() {
                out.push_str(latin);
                last_dash = false;
            }
        } else if ch.is_ascii_alphanumeric() {
            out.push(ch);
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }

    if out.len() > SLUG_MAX {
        out.truncate(SLUG_MAX);
    }
    let trimmed = out.trim_matches('-');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Validate a slug typed by an editor
pub fn parse_slug(input: &str) -> CmsResult<String> {
    let slug = input.trim();
    let well_formed = !slug.is_empty()
        && slug.len() <= SLUG_MAX
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--");

    if well_formed {
        Ok(slug.to_string())
    } else {
        Err(CmsError::Validation(format!(
            "Slug must be 1-{SLUG_MAX} characters of a-z, 0-9 and single dashes"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_latin() {
        assert_eq!(slugify("Hello, World!").as_deref(), Some("hello-world"));
        assert_eq!(slugify("  2025 -- plans ").as_deref(), Some("2025-plans"));
    }

    #[test]
    fn test_slugify_cyrillic() {
        assert_eq!(slugify("Свобода слова").as_deref(), Some("svoboda-slova"));
        assert_eq!(slugify("Щука и ёж").as_deref(), Some("shchuka-i-yozh"));
        assert_eq!(slugify("Объявление").as_deref(), Some("obyavlenie"));
        assert_eq!(slugify("Новости 2025").as_deref(), Some("novosti-2025"));
    }

    #[test]
    fn test_slugify_nothing_left() {
        assert_eq!(slugify("!!! ???"), None);
        assert_eq!(slugify("ъь"), None);
    }

    #[test]
    fn test_slugify_truncates() {
        let slug = slugify(&"a ".repeat(100)).unwrap();
        assert!(slug.len() <= SLUG_MAX);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn test_parse_slug() {
        assert_eq!(parse_slug(" spring-meetup ").unwrap(), "spring-meetup");
        assert!(parse_slug("Spring").is_err());
        assert!(parse_slug("a--b").is_err());
        assert!(parse_slug("-a").is_err());
        assert!(parse_slug("").is_err());
    }
}
