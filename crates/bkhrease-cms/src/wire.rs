//! Response shapes as the CMS sends them
//!
//! Collections arrive as `{data: [{id, attributes}], meta: {pagination}}`
//! and every relation is wrapped once more in `{data: ...}`. These structs
//! only exist to be flattened by [`crate::normalize`].

use serde::{Deserialize, Deserializer};

use crate::model::{
    BoldValues, ContactOverride, MediaFormat, NewsType, Pagination, RichText, SeoMeta,
    SocialLinks, Statistics, TeamCategory, Timestamps,
};
use std::collections::BTreeMap;

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(default)]
    pub meta: Option<Meta>,
}

impl<T> Envelope<T> {
    pub fn pagination(&self) -> Option<Pagination> {
        self.meta.as_ref().and_then(|m| m.pagination)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Entity<A> {
    pub id: u64,
    pub attributes: A,
}

/// To-one relation, `{data: null}` when unset
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Relation<T> {
    #[serde(default)]
    pub data: Option<T>,
}

/// To-many relation
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct RelationList<T> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<T>,
}

impl<T> Default for RelationList<T> {
    fn default() -> Self {
        Self { data: Vec::new() }
    }
}

pub type MediaRelation = Relation<Entity<MediaAttributes>>;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAttributes {
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub alternative_text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub mime: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub formats: BTreeMap<String, MediaFormat>,
}

/// Team member fields. The CMS schema capitalizes some of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberAttributes {
    #[serde(alias = "Name", default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: String,
    #[serde(alias = "Bio", default, deserialize_with = "null_as_default")]
    pub bio: String,
    #[serde(default = "default_team_category")]
    pub category: TeamCategory,
    #[serde(default, deserialize_with = "null_as_default")]
    pub order: i64,
    #[serde(default)]
    pub image: Option<MediaRelation>,
    #[serde(alias = "SocialLinks", default)]
    pub social_links: Option<SocialLinks>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

fn default_team_category() -> TeamCategory {
    TeamCategory::Other
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAttributes {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoAttributes {
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    /// Either a list or a comma-separated string
    #[serde(default)]
    pub keywords: Option<serde_json::Value>,
}

impl From<SeoAttributes> for SeoMeta {
    fn from(seo: SeoAttributes) -> Self {
        let keywords = match seo.keywords {
            Some(serde_json::Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect(),
            Some(serde_json::Value::Array(items)) => items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };
        Self {
            meta_title: seo.meta_title,
            meta_description: seo.meta_description,
            keywords,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostAttributes {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub excerpt: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: RichText,
    #[serde(default)]
    pub featured_image: Option<MediaRelation>,
    #[serde(default)]
    pub author: Option<Relation<Entity<TeamMemberAttributes>>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: RelationList<Entity<CategoryAttributes>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub seo: Option<SeoAttributes>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItemAttributes {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: RichText,
    #[serde(rename = "type")]
    pub kind: NewsType,
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub registration_link: Option<String>,
    #[serde(default)]
    pub featured_image: Option<MediaRelation>,
    #[serde(default)]
    pub is_upcoming: Option<bool>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAttributes {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub detailed_description: RichText,
    #[serde(default, deserialize_with = "null_as_default")]
    pub icon: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub features: Vec<String>,
    #[serde(default)]
    pub contact_info: Option<ContactOverride>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub order: i64,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomepageAttributes {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tagline: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vision: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mission: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bold_values: BoldValues,
    #[serde(default)]
    pub hero_image: Option<MediaRelation>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub statistics: Statistics,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_envelope_with_pagination() {
        let envelope: Envelope<Vec<Entity<CategoryAttributes>>> = serde_json::from_value(json!({
            "data": [
                { "id": 1, "attributes": { "name": "Admissions", "slug": "admissions" } }
            ],
            "meta": { "pagination": { "page": 1, "pageSize": 10, "pageCount": 3, "total": 25 } }
        }))
        .expect("Operation should succeed");

        assert_eq!(envelope.data.len(), 1);
        assert_eq!(
            envelope.pagination(),
            Some(Pagination { page: 1, page_size: 10, page_count: 3, total: 25 })
        );
    }

    #[test]
    fn test_null_relations() {
        let attrs: BlogPostAttributes = serde_json::from_value(json!({
            "title": "Hello",
            "slug": "hello",
            "excerpt": null,
            "content": null,
            "author": { "data": null },
            "categories": { "data": null },
            "featuredImage": { "data": null },
            "tags": null
        }))
        .expect("Operation should succeed");

        assert!(attrs.author.and_then(|a| a.data).is_none());
        assert!(attrs.categories.data.is_empty());
        assert!(attrs.tags.is_empty());
        assert_eq!(attrs.excerpt, "");
    }

    #[test]
    fn test_capitalized_team_fields() {
        let attrs: TeamMemberAttributes = serde_json::from_value(json!({
            "Name": "Ada Obi",
            "role": "Director",
            "Bio": "Bio text",
            "category": "founding-core",
            "order": 1,
            "SocialLinks": { "linkedin": "https://linkedin.com/in/ada" }
        }))
        .expect("Operation should succeed");

        assert_eq!(attrs.name, "Ada Obi");
        assert_eq!(attrs.bio, "Bio text");
        assert_eq!(attrs.category, TeamCategory::FoundingCore);
        assert_eq!(
            attrs.social_links.and_then(|s| s.linkedin).as_deref(),
            Some("https://linkedin.com/in/ada")
        );
    }

    #[test]
    fn test_seo_keywords_from_string() {
        let seo: SeoMeta = SeoAttributes {
            meta_title: None,
            meta_description: None,
            keywords: Some(json!("study abroad, visas ,")),
        }
        .into();
        assert_eq!(seo.keywords, vec!["study abroad", "visas"]);
    }
}
