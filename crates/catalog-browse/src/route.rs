//! Navigation paths.

use serde::Serialize;

/// Where a path leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "route", content = "target", rename_all = "snake_case")]
pub enum Route {
    /// The browsing view.
    Home,
    /// Detail view for one record, by id or name.
    Record(String),
    /// Static "not found" page.
    NotFound(String),
}

impl Route {
    /// Parse `path` for a collection mounted at `/{collection}`.
    ///
    /// `/` is home and `/{collection}/{id}` is a record. A trailing slash or
    /// query string is ignored; anything else is not found.
    pub fn parse(path: &str, collection: &str) -> Self {
        let trimmed = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Self::Home,
            [head, id] if *head == collection && is_identifier(id) => {
                Self::Record((*id).to_string())
            }
            _ => Self::NotFound(path.to_string()),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

fn is_identifier(segment: &str) -> bool {
    segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home() {
        assert_eq!(Route::parse("/", "pokemon"), Route::Home);
        assert_eq!(Route::parse("", "pokemon"), Route::Home);
        assert_eq!(Route::parse("/?page=2", "pokemon"), Route::Home);
    }

    #[test]
    fn test_record() {
        assert_eq!(
            Route::parse("/pokemon/25", "pokemon"),
            Route::Record("25".into())
        );
        assert_eq!(
            Route::parse("/pokemon/mr-mime/", "pokemon"),
            Route::Record("mr-mime".into())
        );
    }

    #[test]
    fn test_not_found() {
        for path in ["/items/25", "/pokemon", "/pokemon/25/moves", "/pokemon/%00"] {
            assert!(Route::parse(path, "pokemon").is_not_found(), "{}", path);
        }
        assert_eq!(
            Route::parse("/nope", "pokemon"),
            Route::NotFound("/nope".into())
        );
    }
}
