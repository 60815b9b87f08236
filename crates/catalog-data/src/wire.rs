//! Upstream response shapes and their mapping into the catalog model.

use catalog_core::{BaseStat, CatalogPage, ImageRefs, ListItem, Measurements, Record, RecordTrait};
use serde::Deserialize;

/// A `{name, url}` pair as used throughout the upstream API.
#[derive(Debug, Clone, Deserialize)]
pub struct NamedRef {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// Body of `GET /{collection}?limit=&offset=`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse {
    pub count: u32,
    pub next: Option<String>,
    pub previous: Option<String>,
    #[serde(default)]
    pub results: Vec<NamedRef>,
}

impl From<ListResponse> for CatalogPage {
    fn from(body: ListResponse) -> Self {
        CatalogPage {
            items: body
                .results
                .into_iter()
                .map(|r| ListItem::new(r.name, r.url))
                .collect(),
            total_count: body.count,
            next_ref: body.next,
            previous_ref: body.previous,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sprites {
    pub front_default: Option<String>,
    pub front_shiny: Option<String>,
    #[serde(default)]
    pub other: Option<OtherSprites>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OtherSprites {
    #[serde(rename = "official-artwork")]
    pub official_artwork: Option<Artwork>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Artwork {
    pub front_default: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeSlot {
    #[serde(rename = "type")]
    pub kind: NamedRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AbilitySlot {
    pub ability: NamedRef,
    #[serde(default)]
    pub is_hidden: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatSlot {
    pub base_stat: u32,
    pub stat: NamedRef,
}

/// Body of `GET /{collection}/{idOrName}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordResponse {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub sprites: Sprites,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub weight: u32,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
    #[serde(default)]
    pub abilities: Vec<AbilitySlot>,
    #[serde(default)]
    pub stats: Vec<StatSlot>,
    pub base_experience: Option<u32>,
}

impl From<RecordResponse> for Record {
    fn from(body: RecordResponse) -> Self {
        let artwork = body
            .sprites
            .other
            .and_then(|o| o.official_artwork)
            .and_then(|a| a.front_default);

        Record {
            id: body.id,
            name: body.name,
            image_refs: ImageRefs {
                primary: body.sprites.front_default,
                artwork,
                alternate: body.sprites.front_shiny,
            },
            measurements: Measurements {
                height: body.height,
                weight: body.weight,
            },
            category_tags: body.types.into_iter().map(|t| t.kind.name).collect(),
            traits: body
                .abilities
                .into_iter()
                .map(|a| RecordTrait {
                    name: a.ability.name,
                    is_rare: a.is_hidden,
                })
                .collect(),
            base_stats: body
                .stats
                .into_iter()
                .map(|s| BaseStat {
                    stat_name: s.stat.name,
                    value: s.base_stat,
                })
                .collect(),
            experience_value: body.base_experience,
        }
    }
}
