use rusqlite::Connection;

use crate::db::queries;

fn fold_latin(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "a",
        'æ' | 'Æ' => "ae",
        'ç' | 'Ç' => "c",
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => "i",
        'ñ' | 'Ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => "o",
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => "u",
        'ý' | 'ÿ' | 'Ý' => "y",
        'ß' => "ss",
        _ => return None,
    };
    Some(folded)
}

/// Lowercase, URL-safe form of a business name: "Joe's Café & Bar" becomes
/// "joes-cafe-bar". Never empty.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if matches!(c, '\'' | '"' | '’' | '‘' | '`') {
            continue;
        }
        let piece = if c.is_ascii_alphanumeric() {
            Some(c.to_ascii_lowercase().to_string())
        } else {
            fold_latin(c).map(str::to_string)
        };
        match piece {
            Some(p) => {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push_str(&p);
            }
            None => pending_dash = true,
        }
    }

    if slug.is_empty() {
        "business".to_string()
    } else {
        slug
    }
}

/// First of `base`, `base-1`, `base-2`, ... not taken by any business.
pub fn next_free_slug(conn: &Connection, base: &str) -> anyhow::Result<String> {
    let mut candidate = base.to_string();
    let mut counter = 1;
    while queries::slug_exists(conn, &candidate)? {
        candidate = format!("{base}-{counter}");
        counter += 1;
    }
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Joe's Cafe"), "joes-cafe");
        assert_eq!(slugify("  Main   Street Barbers!! "), "main-street-barbers");
        assert_eq!(slugify("Café Crème"), "cafe-creme");
        assert_eq!(slugify("A&B 24/7"), "a-b-24-7");
    }

    #[test]
    fn test_slugify_never_empty() {
        assert_eq!(slugify("!!!"), "business");
        assert_eq!(slugify("東京"), "business");
    }
}
