//! Flattening of CMS wire shapes into domain objects

use chrono::{DateTime, NaiveDate, Utc};

use crate::model::{
    BlogPost, Category, HomepageContent, MediaReference, NewsItem, Service, TeamMember,
};
use crate::wire::{
    BlogPostAttributes, CategoryAttributes, Entity, HomepageAttributes, MediaRelation,
    NewsItemAttributes, ServiceAttributes, TeamMemberAttributes,
};

pub fn media(relation: Option<MediaRelation>) -> Option<MediaReference> {
    let Entity { id, attributes } = relation?.data?;
    Some(MediaReference {
        id,
        url: attributes.url,
        alternative_text: attributes.alternative_text,
        name: attributes.name,
        caption: attributes.caption,
        width: attributes.width,
        height: attributes.height,
        mime: attributes.mime,
        formats: attributes.formats,
    })
}

pub fn team_member(entity: Entity<TeamMemberAttributes>) -> TeamMember {
    let Entity { id, attributes } = entity;
    TeamMember {
        id,
        name: attributes.name,
        role: attributes.role,
        bio: attributes.bio,
        category: attributes.category,
        order: attributes.order,
        social_links: attributes.social_links,
        image: media(attributes.image),
        timestamps: attributes.timestamps,
    }
}

pub fn category(entity: Entity<CategoryAttributes>) -> Category {
    let Entity { id, attributes } = entity;
    Category {
        id,
        name: attributes.name,
        slug: attributes.slug,
        description: attributes.description,
        timestamps: attributes.timestamps,
    }
}

pub fn blog_post(entity: Entity<BlogPostAttributes>) -> BlogPost {
    let Entity { id, attributes } = entity;
    BlogPost {
        id,
        title: attributes.title,
        slug: attributes.slug,
        excerpt: attributes.excerpt,
        content: attributes.content,
        featured_image: media(attributes.featured_image),
        author: attributes.author.and_then(|a| a.data).map(team_member),
        categories: attributes
            .categories
            .data
            .into_iter()
            .map(category)
            .collect(),
        tags: attributes.tags,
        seo: attributes.seo.map(Into::into),
        timestamps: attributes.timestamps,
    }
}

/// `now` decides whether an event is still upcoming.
pub fn news_item(entity: Entity<NewsItemAttributes>, now: DateTime<Utc>) -> NewsItem {
    let Entity { id, attributes } = entity;
    let is_upcoming = is_upcoming(
        attributes.event_date.as_deref(),
        attributes.is_upcoming,
        now,
    );
    NewsItem {
        id,
        title: attributes.title,
        slug: attributes.slug,
        content: attributes.content,
        kind: attributes.kind,
        event_date: attributes.event_date,
        registration_link: attributes.registration_link,
        featured_image: media(attributes.featured_image),
        is_upcoming,
        timestamps: attributes.timestamps,
    }
}

pub fn service(entity: Entity<ServiceAttributes>) -> Service {
    let Entity { id, attributes } = entity;
    Service {
        id,
        title: attributes.title,
        slug: attributes.slug,
        description: attributes.description,
        detailed_description: attributes.detailed_description,
        icon: attributes.icon,
        features: attributes.features,
        contact_info: attributes.contact_info,
        order: attributes.order,
        timestamps: attributes.timestamps,
    }
}

pub fn homepage(entity: Entity<HomepageAttributes>) -> HomepageContent {
    let Entity { id, attributes } = entity;
    HomepageContent {
        id,
        tagline: attributes.tagline,
        vision: attributes.vision,
        mission: attributes.mission,
        bold_values: attributes.bold_values,
        hero_image: media(attributes.hero_image),
        statistics: attributes.statistics,
        timestamps: attributes.timestamps,
    }
}

/// An event is upcoming when its date has not passed yet.
///
/// Date-only values count for the whole day. Without a parseable date the
/// flag stored in the CMS is used.
pub fn is_upcoming(event_date: Option<&str>, stored: Option<bool>, now: DateTime<Utc>) -> bool {
    let parsed = event_date.and_then(|raw| {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc) >= now)
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .map(|date| date >= now.date_naive())
            })
    });
    parsed.or(stored).unwrap_or(false)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::model::{NewsType, RichText, TeamCategory};
    use crate::wire::Envelope;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).single().expect("valid date")
    }

    fn media_json(id: u64, url: &str) -> Value {
        json!({
            "data": {
                "id": id,
                "attributes": {
                    "name": "photo.jpg",
                    "alternativeText": "Portrait",
                    "width": 800,
                    "height": 600,
                    "mime": "image/jpeg",
                    "url": url,
                    "formats": {
                        "thumbnail": { "url": "/uploads/thumbnail_photo.jpg", "width": 156, "height": 117 }
                    }
                }
            }
        })
    }

    fn blog_fixture() -> Value {
        json!({
            "data": [{
                "id": 12,
                "attributes": {
                    "title": "Studying in Canada",
                    "slug": "studying-in-canada",
                    "excerpt": "What to expect",
                    "content": [
                        { "type": "paragraph", "children": [{ "type": "text", "text": "Body" }] }
                    ],
                    "tags": ["canada", "visa"],
                    "publishedAt": "2026-09-01T08:00:00.000Z",
                    "createdAt": "2026-08-30T08:00:00.000Z",
                    "updatedAt": "2026-09-01T08:00:00.000Z",
                    "featuredImage": media_json(4, "/uploads/cover.jpg"),
                    "author": {
                        "data": {
                            "id": 2,
                            "attributes": {
                                "Name": "Ada Obi",
                                "role": "Director",
                                "Bio": "Counsellor",
                                "category": "founding-core",
                                "order": 1,
                                "image": media_json(5, "/uploads/ada.jpg")
                            }
                        }
                    },
                    "categories": {
                        "data": [
                            { "id": 7, "attributes": { "name": "Admissions", "slug": "admissions" } }
                        ]
                    },
                    "seo": { "metaTitle": "Canada", "keywords": ["canada"] }
                }
            }],
            "meta": { "pagination": { "page": 1, "pageSize": 10, "pageCount": 1, "total": 1 } }
        })
    }

    fn contains_wire_keys(value: &Value) -> bool {
        match value {
            Value::Object(map) => {
                map.contains_key("data")
                    || map.contains_key("attributes")
                    || map.values().any(contains_wire_keys)
            }
            Value::Array(items) => items.iter().any(contains_wire_keys),
            _ => false,
        }
    }

    #[test]
    fn test_blog_post_flattens_every_relation() {
        let envelope: Envelope<Vec<Entity<BlogPostAttributes>>> =
            serde_json::from_value(blog_fixture()).expect("Operation should succeed");
        let posts: Vec<_> = envelope.data.into_iter().map(blog_post).collect();
        let post = &posts[0];

        assert_eq!(post.id, 12);
        assert_eq!(post.slug, "studying-in-canada");
        assert_eq!(post.author.as_ref().map(|a| a.name.as_str()), Some("Ada Obi"));
        assert_eq!(
            post.author.as_ref().and_then(|a| a.image.as_ref()).map(|i| i.id),
            Some(5)
        );
        assert_eq!(post.categories[0].slug, "admissions");
        assert_eq!(post.featured_image.as_ref().map(|m| m.url.as_str()), Some("/uploads/cover.jpg"));
        assert!(matches!(post.content, RichText::Blocks(_)));

        let output = serde_json::to_value(&posts).expect("Operation should succeed");
        assert!(!contains_wire_keys(&output), "wire keys left in {output}");
    }

    #[test]
    fn test_media_absent() {
        assert!(media(None).is_none());
        let empty = serde_json::from_value(json!({ "data": null })).expect("Operation should succeed");
        assert!(media(Some(empty)).is_none());
    }

    #[test]
    fn test_media_keeps_variants() {
        let relation = serde_json::from_value(media_json(9, "/uploads/a.jpg"))
            .expect("Operation should succeed");
        let reference = media(Some(relation)).expect("media should be present");

        assert_eq!(reference.alternative_text.as_deref(), Some("Portrait"));
        assert_eq!(reference.formats["thumbnail"].width, Some(156));
    }

    #[test]
    fn test_team_member_fixture() {
        let entity: Entity<TeamMemberAttributes> = serde_json::from_value(json!({
            "id": 3,
            "attributes": {
                "Name": "Bola Ade",
                "role": "Advisor",
                "Bio": "Ten years of admissions work",
                "category": "sub-team",
                "order": 4,
                "SocialLinks": { "email": "bola@bkhrease.com" },
                "image": { "data": null }
            }
        }))
        .expect("Operation should succeed");

        let member = team_member(entity);
        assert_eq!(member.name, "Bola Ade");
        assert_eq!(member.category, TeamCategory::SubTeam);
        assert!(member.image.is_none());
        assert_eq!(
            member.social_links.and_then(|s| s.email).as_deref(),
            Some("bola@bkhrease.com")
        );
    }

    #[test]
    fn test_service_fixture_keeps_string_description() {
        let entity: Entity<ServiceAttributes> = serde_json::from_value(json!({
            "id": 1,
            "attributes": {
                "title": "Visa Support",
                "description": "End-to-end visa help",
                "detailedDescription": "Long form text",
                "icon": "passport",
                "features": ["Document review", "Interview prep"],
                "contactInfo": { "email": "visa@bkhrease.com", "phone": "+234" },
                "order": 2
            }
        }))
        .expect("Operation should succeed");

        let svc = service(entity);
        assert_eq!(svc.detailed_description, RichText::Text("Long form text".to_string()));
        assert_eq!(svc.features.len(), 2);
        assert_eq!(
            svc.contact_info.and_then(|c| c.email).as_deref(),
            Some("visa@bkhrease.com")
        );
    }

    #[test]
    fn test_news_item_upcoming_from_event_date() {
        let entity: Entity<NewsItemAttributes> = serde_json::from_value(json!({
            "id": 5,
            "attributes": {
                "title": "Open day",
                "slug": "open-day",
                "content": "Come along",
                "type": "event",
                "eventDate": "2026-11-01T10:00:00.000Z",
                "isUpcoming": false
            }
        }))
        .expect("Operation should succeed");

        let item = news_item(entity, fixed_now());
        assert_eq!(item.kind, NewsType::Event);
        assert!(item.is_upcoming);
    }

    #[test]
    fn test_is_upcoming_rules() {
        let now = fixed_now();
        assert!(!is_upcoming(Some("2026-10-01T10:00:00Z"), Some(true), now));
        assert!(is_upcoming(Some("2026-10-16"), None, now));
        assert!(!is_upcoming(Some("2026-10-15"), None, now));
        assert!(is_upcoming(Some("next spring"), Some(true), now));
        assert!(!is_upcoming(None, None, now));
    }

    #[test]
    fn test_homepage_fixture() {
        let entity: Entity<HomepageAttributes> = serde_json::from_value(json!({
            "id": 1,
            "attributes": {
                "tagline": "Believe. Overcome. Lead. Deliver.",
                "vision": "v",
                "mission": "m",
                "boldValues": { "believe": "b", "overcome": "o", "lead": "l", "deliver": "d" },
                "statistics": { "studentsTrained": 1200, "foundingYear": 2019, "partnersCount": 14 },
                "heroImage": media_json(8, "/uploads/hero.jpg")
            }
        }))
        .expect("Operation should succeed");

        let page = homepage(entity);
        assert_eq!(page.statistics.students_trained, 1200);
        assert_eq!(page.bold_values.deliver, "d");
        assert_eq!(page.hero_image.map(|m| m.id), Some(8));
    }
}
