//! Static catalog data: tag dictionary, characters and missions.
//!
//! A [`Catalog`] is validated once when it is built. Every planning call
//! borrows it immutably and relies on its referential integrity: each tag id
//! carried by a character or listed in a condition exists in the dictionary
//! under the same category.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;

use crate::bitmask::TagBitmaskIndex;
use crate::constants::FALLBACK_LOCALE;

pub type TagId = String;
pub type CharacterId = String;
pub type MissionId = String;

/// The five fixed tag dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Role,
    Style,
    Faction,
    Element,
    Rarity,
}

impl Category {
    pub const COUNT: usize = 5;
    pub const ALL: [Self; Self::COUNT] = [
        Self::Role,
        Self::Style,
        Self::Faction,
        Self::Element,
        Self::Rarity,
    ];

    /// Dense index in `0..Category::COUNT`.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Role => 0,
            Self::Style => 1,
            Self::Faction => 2,
            Self::Element => 3,
            Self::Rarity => 4,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Role => "role",
            Self::Style => "style",
            Self::Faction => "faction",
            Self::Element => "element",
            Self::Rarity => "rarity",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Localized display strings keyed by locale (`ja`, `zh-Hans`, `en`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Labels(pub BTreeMap<String, String>);

impl Labels {
    /// Pick the label for `locale`, then English, then any label, then `fallback`.
    #[must_use]
    pub fn display<'a>(&'a self, locale: &str, fallback: &'a str) -> &'a str {
        self.0
            .get(locale)
            .or_else(|| self.0.get(FALLBACK_LOCALE))
            .or_else(|| self.0.values().next())
            .map_or(fallback, String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    #[serde(default)]
    pub labels: Labels,
}

/// Ordered tag lists, one per category. Order fixes bit positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TagDictionary {
    #[serde(default)]
    pub role: Vec<Tag>,
    #[serde(default)]
    pub style: Vec<Tag>,
    #[serde(default)]
    pub faction: Vec<Tag>,
    #[serde(default)]
    pub element: Vec<Tag>,
    #[serde(default)]
    pub rarity: Vec<Tag>,
}

impl TagDictionary {
    /// Load a tag dictionary from a JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a tag dictionary.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn tags(&self, category: Category) -> &[Tag] {
        match category {
            Category::Role => &self.role,
            Category::Style => &self.style,
            Category::Faction => &self.faction,
            Category::Element => &self.element,
            Category::Rarity => &self.rarity,
        }
    }

    #[must_use]
    pub fn find(&self, category: Category, id: &str) -> Option<&Tag> {
        self.tags(category).iter().find(|tag| tag.id == id)
    }
}

/// Tag ids a character carries, per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CharacterTags {
    #[serde(default)]
    pub role: Vec<TagId>,
    #[serde(default)]
    pub style: Vec<TagId>,
    #[serde(default)]
    pub faction: Vec<TagId>,
    #[serde(default)]
    pub element: Vec<TagId>,
    #[serde(default)]
    pub rarity: Vec<TagId>,
}

impl CharacterTags {
    #[must_use]
    pub fn get(&self, category: Category) -> &[TagId] {
        match category {
            Category::Role => &self.role,
            Category::Style => &self.style,
            Category::Faction => &self.faction,
            Category::Element => &self.element,
            Category::Rarity => &self.rarity,
        }
    }

    fn get_mut(&mut self, category: Category) -> &mut Vec<TagId> {
        match category {
            Category::Role => &mut self.role,
            Category::Style => &mut self.style,
            Category::Faction => &mut self.faction,
            Category::Element => &mut self.element,
            Category::Rarity => &mut self.rarity,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &TagId)> + '_ {
        Category::ALL
            .into_iter()
            .flat_map(move |category| self.get(category).iter().map(move |id| (category, id)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    #[serde(default)]
    pub labels: Labels,
    #[serde(default)]
    pub tags: CharacterTags,
}

impl Character {
    /// Bare character with no tags, extended with [`Character::with_tag`].
    #[must_use]
    pub fn new(id: impl Into<CharacterId>) -> Self {
        Self {
            id: id.into(),
            labels: Labels::default(),
            tags: CharacterTags::default(),
        }
    }

    #[must_use]
    pub fn with_tag(mut self, category: Category, tag: impl Into<TagId>) -> Self {
        self.tags.get_mut(category).push(tag.into());
        self
    }

    #[must_use]
    pub fn carries(&self, category: Category, tag: &str) -> bool {
        self.tags.get(category).iter().any(|carried| carried == tag)
    }

    /// Load a character list from a JSON array
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into characters.
    pub fn list_from_json(json: &str) -> Result<Vec<Self>, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// One categorical requirement: members must carry tags from `any_of`.
///
/// A list without repeated ids is satisfied by any member carrying any of
/// the tags. Repeating an id `k` times demands `k` distinct members with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub category: Category,
    #[serde(alias = "anyOf")]
    pub any_of: Vec<TagId>,
}

impl Condition {
    #[must_use]
    pub fn new<I, S>(category: Category, any_of: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TagId>,
    {
        Self {
            category,
            any_of: any_of.into_iter().map(Into::into).collect(),
        }
    }

    /// Distinct tag ids with their multiplicity, in first-appearance order.
    #[must_use]
    pub fn requirements(&self) -> SmallVec<[(&str, usize); 4]> {
        let mut grouped: SmallVec<[(&str, usize); 4]> = SmallVec::new();
        for tag in &self.any_of {
            match grouped.iter_mut().find(|(id, _)| *id == tag.as_str()) {
                Some((_, count)) => *count += 1,
                None => grouped.push((tag.as_str(), 1)),
            }
        }
        grouped
    }

    #[must_use]
    pub fn is_count_based(&self) -> bool {
        self.requirements().iter().any(|(_, count)| *count > 1)
    }
}

/// Reward granted on completing a mission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reward {
    Item { id: String, quantity: u32 },
    Currency { id: String, amount: u32 },
    Experience { amount: u32 },
}

impl fmt::Display for Reward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Item { id, quantity } => write!(f, "{id} x{quantity}"),
            Self::Currency { id, amount } => write!(f, "{amount} {id}"),
            Self::Experience { amount } => write!(f, "{amount} xp"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    pub id: MissionId,
    #[serde(default)]
    pub labels: Labels,
    #[serde(alias = "requiredLevel")]
    pub required_level: u32,
    #[serde(alias = "baseConditions")]
    pub base_conditions: Vec<Condition>,
    #[serde(default, alias = "bonusConditions")]
    pub bonus_conditions: Vec<Condition>,
    #[serde(default)]
    pub rewards: Vec<Reward>,
    #[serde(default, alias = "bonusRewards")]
    pub bonus_rewards: Vec<Reward>,
}

impl Mission {
    #[must_use]
    pub fn new(
        id: impl Into<MissionId>,
        required_level: u32,
        base_conditions: Vec<Condition>,
    ) -> Self {
        Self {
            id: id.into(),
            labels: Labels::default(),
            required_level,
            base_conditions,
            bonus_conditions: Vec::new(),
            rewards: Vec::new(),
            bonus_rewards: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_bonus(mut self, bonus_conditions: Vec<Condition>) -> Self {
        self.bonus_conditions = bonus_conditions;
        self
    }

    /// Mission value used by the assignment objective.
    #[must_use]
    pub fn value(&self) -> usize {
        self.base_conditions.len()
    }

    #[must_use]
    pub fn has_bonus(&self) -> bool {
        !self.bonus_conditions.is_empty()
    }

    /// Base conditions followed by bonus conditions.
    pub fn all_conditions(&self) -> impl Iterator<Item = &Condition> {
        self.base_conditions.iter().chain(&self.bonus_conditions)
    }

    /// Load a mission list from a JSON array
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into missions.
    pub fn list_from_json(json: &str) -> Result<Vec<Self>, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Errors raised while building a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse catalog data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("category {category} has {count} tags, exceeding the {max}-bit mask width")]
    TagOverflow {
        category: Category,
        count: usize,
        max: usize,
    },
    #[error("duplicate tag id {tag} in category {category}")]
    DuplicateTag { category: Category, tag: TagId },
    #[error("duplicate character id {0}")]
    DuplicateCharacter(CharacterId),
    #[error("duplicate mission id {0}")]
    DuplicateMission(MissionId),
    #[error("{owner} references unknown {category} tag {tag}")]
    UnknownTag {
        owner: String,
        category: Category,
        tag: TagId,
    },
    #[error("mission {mission} has an empty condition list")]
    EmptyConditions { mission: MissionId },
}

/// Validated, immutable planning context.
#[derive(Debug, Clone)]
pub struct Catalog {
    tags: TagDictionary,
    characters: Vec<Character>,
    missions: Vec<Mission>,
    character_lookup: HashMap<CharacterId, usize>,
    mission_lookup: HashMap<MissionId, usize>,
    index: TagBitmaskIndex,
}

impl Catalog {
    /// Validate the three catalogs and build the tag bitmask index.
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate ids, tag references missing from the
    /// dictionary, empty mission requirements, or a category with more tags
    /// than the bitmask width.
    pub fn new(
        tags: TagDictionary,
        characters: Vec<Character>,
        missions: Vec<Mission>,
    ) -> Result<Self, CatalogError> {
        let index = TagBitmaskIndex::build(&tags)?;

        let mut character_lookup = HashMap::with_capacity(characters.len());
        for (position, character) in characters.iter().enumerate() {
            if character_lookup
                .insert(character.id.clone(), position)
                .is_some()
            {
                return Err(CatalogError::DuplicateCharacter(character.id.clone()));
            }
            for (category, tag) in character.tags.iter() {
                ensure_known(&index, &character.id, category, tag)?;
            }
        }

        let mut mission_lookup = HashMap::with_capacity(missions.len());
        for (position, mission) in missions.iter().enumerate() {
            if mission_lookup.insert(mission.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateMission(mission.id.clone()));
            }
            let empty = mission.base_conditions.is_empty()
                || mission.all_conditions().any(|c| c.any_of.is_empty());
            if empty {
                return Err(CatalogError::EmptyConditions {
                    mission: mission.id.clone(),
                });
            }
            for condition in mission.all_conditions() {
                for tag in &condition.any_of {
                    ensure_known(&index, &mission.id, condition.category, tag)?;
                }
            }
        }

        log::debug!(
            "catalog built: {} characters, {} missions, tags per category {:?}",
            characters.len(),
            missions.len(),
            Category::ALL.map(|category| index.tag_count(category))
        );

        Ok(Self {
            tags,
            characters,
            missions,
            character_lookup,
            mission_lookup,
            index,
        })
    }

    /// Parse and validate a catalog from its three JSON documents.
    ///
    /// # Errors
    ///
    /// Returns an error if any document fails to parse or validation fails.
    pub fn from_json(tags: &str, characters: &str, missions: &str) -> Result<Self, CatalogError> {
        Self::new(
            TagDictionary::from_json(tags)?,
            Character::list_from_json(characters)?,
            Mission::list_from_json(missions)?,
        )
    }

    #[must_use]
    pub const fn tags(&self) -> &TagDictionary {
        &self.tags
    }

    #[must_use]
    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    #[must_use]
    pub fn missions(&self) -> &[Mission] {
        &self.missions
    }

    #[must_use]
    pub const fn index(&self) -> &TagBitmaskIndex {
        &self.index
    }

    #[must_use]
    pub fn character(&self, id: &str) -> Option<&Character> {
        self.character_lookup
            .get(id)
            .and_then(|&position| self.characters.get(position))
    }

    #[must_use]
    pub fn mission(&self, id: &str) -> Option<&Mission> {
        self.mission_lookup
            .get(id)
            .and_then(|&position| self.missions.get(position))
    }
}

fn ensure_known(
    index: &TagBitmaskIndex,
    owner: &str,
    category: Category,
    tag: &str,
) -> Result<(), CatalogError> {
    if index.bit(category, tag).is_some() {
        Ok(())
    } else {
        Err(CatalogError::UnknownTag {
            owner: owner.to_string(),
            category,
            tag: tag.to_string(),
        })
    }
}
