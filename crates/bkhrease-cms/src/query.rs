//! Query-string builder for CMS collection endpoints

use std::fmt::{self, Display};
use url::form_urlencoded::byte_serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Ordered list of query parameters.
///
/// Keys keep their bracket syntax (`filters[slug][$eq]`); values are
/// percent-encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Display) -> Self {
        self.pairs.push((key.into(), value.to_string()));
        self
    }

    /// Populate every relation one level deep
    #[must_use]
    pub fn populate_all(self) -> Self {
        self.param("populate", "*")
    }

    #[must_use]
    pub fn page(self, page: u32) -> Self {
        self.param("pagination[page]", page)
    }

    #[must_use]
    pub fn page_size(self, page_size: u32) -> Self {
        self.param("pagination[pageSize]", page_size)
    }

    #[must_use]
    pub fn sort(self, field: &str, order: SortOrder) -> Self {
        self.param("sort", format!("{field}:{}", order.as_str()))
    }

    /// `filters[<field>][<op>]=<value>`
    #[must_use]
    pub fn filter(self, field: &str, op: &str, value: impl Display) -> Self {
        self.filter_path(&[field], op, value)
    }

    /// Filter on a nested path, e.g. `["categories", "slug"]` or
    /// `["$or", "0", "title"]`.
    #[must_use]
    pub fn filter_path(self, path: &[&str], op: &str, value: impl Display) -> Self {
        let mut key = String::from("filters");
        for segment in path {
            key.push('[');
            key.push_str(segment);
            key.push(']');
        }
        key.push('[');
        key.push_str(op);
        key.push(']');
        self.param(key, value)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Endpoint path for a collection, with the query string appended
    pub fn endpoint(&self, collection: &str) -> String {
        format!("/{}{self}", collection.trim_start_matches('/'))
    }
}

impl Display for Query {
    /// Renders `?k=v&...`, or nothing when empty
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.pairs.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{key}=")?;
            for chunk in byte_serialize(value.as_bytes()) {
                f.write_str(chunk)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_blog_listing_query() {
        let query = Query::new()
            .populate_all()
            .page(2)
            .page_size(10)
            .sort("publishedAt", SortOrder::Desc);

        assert_eq!(
            query.endpoint("blog-posts"),
            "/blog-posts?populate=*&pagination[page]=2&pagination[pageSize]=10&sort=publishedAt%3Adesc"
        );
    }

    #[test]
    fn test_nested_filter_and_encoding() {
        let query = Query::new()
            .filter_path(&["$or", "0", "title"], "$containsi", "ielts prep & tips")
            .filter_path(&["categories", "slug"], "$eq", "study-abroad");

        assert_eq!(
            query.to_string(),
            "?filters[$or][0][title][$containsi]=ielts+prep+%26+tips&filters[categories][slug][$eq]=study-abroad"
        );
    }

    #[test]
    fn test_empty_query() {
        let query = Query::new();
        assert!(query.is_empty());
        assert_eq!(query.endpoint("/health-check"), "/health-check");
    }
}
