//! Normalized domain objects
//!
//! These types are independent of the CMS wire shape: relations are
//! embedded directly and no `data`/`attributes` nesting survives. They
//! serialize with camelCase field names, which is what page templates and
//! the forms service expect.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;

/// Fields shared by every content collection
pub trait ContentItem {
    /// CMS-assigned id
    fn id(&self) -> u64;

    /// URL slug, for collections that have one
    fn slug(&self) -> Option<&str>;

    /// Creation, update and publish timestamps
    fn timestamps(&self) -> &Timestamps;
}

/// ISO 8601 timestamps maintained by the CMS
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timestamps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

/// Body text: either a plain string or rich-text blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RichText {
    Text(String),
    Blocks(Vec<Value>),
}

impl RichText {
    /// Concatenated plain text, walking block children for `text` leaves.
    pub fn plain_text(&self) -> String {
        fn collect(value: &Value, out: &mut String) {
            match value {
                Value::Object(map) => {
                    if let Some(Value::String(text)) = map.get("text") {
                        out.push_str(text);
                    }
                    if let Some(Value::Array(children)) = map.get("children") {
                        for child in children {
                            collect(child, out);
                        }
                    }
                }
                Value::Array(items) => {
                    for item in items {
                        collect(item, out);
                    }
                }
                _ => {}
            }
        }

        match self {
            Self::Text(text) => text.clone(),
            Self::Blocks(blocks) => {
                let mut out = String::new();
                for (i, block) in blocks.iter().enumerate() {
                    if i > 0 {
                        out.push('\n');
                    }
                    collect(block, &mut out);
                }
                out
            }
        }
    }
}

impl Default for RichText {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

/// One size variant of an uploaded image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFormat {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

/// Uploaded media owned by the embedding entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaReference {
    pub id: u64,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    /// Keyed by variant name (thumbnail, small, medium, large)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub formats: BTreeMap<String, MediaFormat>,
}

/// Display grouping for team members.
///
/// Variants are declared in display priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TeamCategory {
    FoundingCore,
    SubTeam,
    #[serde(other)]
    Other,
}

impl TeamCategory {
    /// Sort priority, lowest first
    pub fn priority(self) -> u8 {
        match self {
            Self::FoundingCore => 1,
            Self::SubTeam => 2,
            Self::Other => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FoundingCore => "founding-core",
            Self::SubTeam => "sub-team",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for TeamCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TeamCategory {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "founding-core" => Ok(Self::FoundingCore),
            "sub-team" => Ok(Self::SubTeam),
            "other" => Ok(Self::Other),
            _ => Err(ApiError::invalid_request(format!(
                "Unknown team category: {s}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: u64,
    pub name: String,
    pub role: String,
    pub bio: String,
    pub category: TeamCategory,
    pub order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_links: Option<SocialLinks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<MediaReference>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl TeamMember {
    /// Listing order: display order, ties broken by name.
    pub fn listing_cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.order
            .cmp(&other.order)
            .then_with(|| self.name.cmp(&other.name))
    }

    /// Page order: category priority first, then listing order.
    pub fn display_cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.category
            .priority()
            .cmp(&other.category.priority())
            .then_with(|| self.listing_cmp(other))
    }
}

/// Group members by category, each group in listing order.
pub fn group_by_category(members: &[TeamMember]) -> BTreeMap<TeamCategory, Vec<TeamMember>> {
    let mut groups: BTreeMap<TeamCategory, Vec<TeamMember>> = BTreeMap::new();
    for member in members {
        groups
            .entry(member.category)
            .or_default()
            .push(member.clone());
    }
    for group in groups.values_mut() {
        group.sort_by(TeamMember::listing_cmp);
    }
    groups
}

impl ContentItem for TeamMember {
    fn id(&self) -> u64 {
        self.id
    }

    fn slug(&self) -> Option<&str> {
        None
    }

    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: u64,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: u64,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: RichText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<MediaReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<TeamMember>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo: Option<SeoMeta>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl ContentItem for BlogPost {
    fn id(&self) -> u64 {
        self.id
    }

    fn slug(&self) -> Option<&str> {
        Some(&self.slug)
    }

    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsType {
    Event,
    Publication,
    Achievement,
    Announcement,
}

impl NewsType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Publication => "publication",
            Self::Achievement => "achievement",
            Self::Announcement => "announcement",
        }
    }
}

impl fmt::Display for NewsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NewsType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "event" => Ok(Self::Event),
            "publication" => Ok(Self::Publication),
            "achievement" => Ok(Self::Achievement),
            "announcement" => Ok(Self::Announcement),
            _ => Err(ApiError::invalid_request(format!("Unknown news type: {s}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: u64,
    pub title: String,
    pub slug: String,
    pub content: RichText,
    #[serde(rename = "type")]
    pub kind: NewsType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<MediaReference>,
    pub is_upcoming: bool,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl ContentItem for NewsItem {
    fn id(&self) -> u64 {
        self.id
    }

    fn slug(&self) -> Option<&str> {
        Some(&self.slug)
    }

    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }
}

/// Contact details that override the site defaults for one service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: u64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub description: String,
    pub detailed_description: RichText,
    pub icon: String,
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<ContactOverride>,
    pub order: i64,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl ContentItem for Service {
    fn id(&self) -> u64 {
        self.id
    }

    fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoldValues {
    pub believe: String,
    pub overcome: String,
    pub lead: String,
    pub deliver: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Statistics {
    pub students_trained: u64,
    pub founding_year: u32,
    pub partners_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomepageContent {
    pub id: u64,
    pub tagline: String,
    pub vision: String,
    pub mission: String,
    pub bold_values: BoldValues,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_image: Option<MediaReference>,
    pub statistics: Statistics,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub page_count: u32,
    pub total: u64,
}

/// One page of a collection listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

/// Newsletter list a subscriber joins
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsletterList {
    #[default]
    Blog,
    News,
}

/// Fields of a contact-form submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    pub message: String,
}

/// Result envelope of the write paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Ok,
    Error,
}

/// Result of a CMS health probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: HealthState,
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn member(name: &str, category: TeamCategory, order: i64) -> TeamMember {
        TeamMember {
            id: 1,
            name: name.to_string(),
            role: String::new(),
            bio: String::new(),
            category,
            order,
            social_links: None,
            image: None,
            timestamps: Timestamps::default(),
        }
    }

    #[test]
    fn test_team_category_wire_names() {
        let parsed: TeamCategory =
            serde_json::from_value(json!("founding-core")).expect("Operation should succeed");
        assert_eq!(parsed, TeamCategory::FoundingCore);

        let unknown: TeamCategory =
            serde_json::from_value(json!("advisors")).expect("Operation should succeed");
        assert_eq!(unknown, TeamCategory::Other);

        assert_eq!("sub-team".parse::<TeamCategory>().ok(), Some(TeamCategory::SubTeam));
        assert!("advisors".parse::<TeamCategory>().is_err());
    }

    #[test]
    fn test_display_order() {
        let mut members = vec![
            member("Zed", TeamCategory::Other, 1),
            member("Bola", TeamCategory::SubTeam, 2),
            member("Ada", TeamCategory::SubTeam, 2),
            member("Kemi", TeamCategory::FoundingCore, 5),
        ];
        members.sort_by(TeamMember::display_cmp);

        let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Kemi", "Ada", "Bola", "Zed"]);
    }

    #[test]
    fn test_group_by_category() {
        let members = vec![
            member("B", TeamCategory::FoundingCore, 2),
            member("C", TeamCategory::Other, 0),
            member("A", TeamCategory::FoundingCore, 1),
        ];
        let groups = group_by_category(&members);

        let keys: Vec<_> = groups.keys().copied().collect();
        assert_eq!(keys, vec![TeamCategory::FoundingCore, TeamCategory::Other]);
        assert_eq!(groups[&TeamCategory::FoundingCore][0].name, "A");
    }

    #[test]
    fn test_rich_text_duality() {
        let text: RichText = serde_json::from_value(json!("Plain body")).expect("Operation should succeed");
        assert_eq!(text, RichText::Text("Plain body".to_string()));

        let blocks: RichText = serde_json::from_value(json!([
            { "type": "paragraph", "children": [{ "type": "text", "text": "First" }] },
            { "type": "paragraph", "children": [
                { "type": "text", "text": "Second " },
                { "type": "text", "text": "line", "bold": true }
            ] }
        ]))
        .expect("Operation should succeed");

        assert!(matches!(blocks, RichText::Blocks(ref b) if b.len() == 2));
        assert_eq!(blocks.plain_text(), "First\nSecond line");
    }

    #[test]
    fn test_news_item_serializes_type_field() {
        let item = NewsItem {
            id: 3,
            title: "Open day".to_string(),
            slug: "open-day".to_string(),
            content: RichText::default(),
            kind: NewsType::Event,
            event_date: Some("2026-11-01T10:00:00.000Z".to_string()),
            registration_link: None,
            featured_image: None,
            is_upcoming: true,
            timestamps: Timestamps::default(),
        };
        let value = serde_json::to_value(&item).expect("Operation should succeed");

        assert_eq!(value["type"], json!("event"));
        assert_eq!(value["eventDate"], json!("2026-11-01T10:00:00.000Z"));
        assert_eq!(value["isUpcoming"], json!(true));
    }
}
