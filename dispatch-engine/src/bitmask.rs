//! Per-category tag bitmasks.
//!
//! Every tag id gets a bit position inside its own category's field, so
//! positions repeat across categories. Masks answer "which tags are
//! relevant", never "how many": duplicate ids in a condition collapse.

use std::collections::HashMap;

use crate::catalog::{CatalogError, Category, Character, Condition, TagDictionary, TagId};

pub type TagMask = u64;

/// Tags a single category may hold before the mask overflows.
pub const MAX_TAGS_PER_CATEGORY: usize = TagMask::BITS as usize;

/// One mask per category, indexed by [`Category::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CategoryMasks([TagMask; Category::COUNT]);

impl CategoryMasks {
    #[must_use]
    pub const fn get(&self, category: Category) -> TagMask {
        self.0[category.index()]
    }

    pub fn insert(&mut self, category: Category, mask: TagMask) {
        self.0[category.index()] |= mask;
    }

    #[must_use]
    pub fn union(mut self, other: &Self) -> Self {
        for (mine, theirs) in self.0.iter_mut().zip(other.0) {
            *mine |= theirs;
        }
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|mask| *mask == 0)
    }
}

/// Category-scoped mask of the distinct tags a condition lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConditionMask {
    pub category: Category,
    pub mask: TagMask,
}

#[derive(Debug, Clone, Default)]
pub struct TagBitmaskIndex {
    positions: [HashMap<TagId, u32>; Category::COUNT],
}

impl TagBitmaskIndex {
    /// Assign bit positions in dictionary order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::TagOverflow`] when a category holds more tags
    /// than [`MAX_TAGS_PER_CATEGORY`], and [`CatalogError::DuplicateTag`]
    /// when an id repeats within a category.
    pub fn build(dictionary: &TagDictionary) -> Result<Self, CatalogError> {
        let mut index = Self::default();
        for category in Category::ALL {
            let tags = dictionary.tags(category);
            if tags.len() > MAX_TAGS_PER_CATEGORY {
                return Err(CatalogError::TagOverflow {
                    category,
                    count: tags.len(),
                    max: MAX_TAGS_PER_CATEGORY,
                });
            }
            let positions = &mut index.positions[category.index()];
            positions.reserve(tags.len());
            for (bit, tag) in (0_u32..).zip(tags) {
                if positions.insert(tag.id.clone(), bit).is_some() {
                    return Err(CatalogError::DuplicateTag {
                        category,
                        tag: tag.id.clone(),
                    });
                }
            }
        }
        Ok(index)
    }

    /// Single-bit mask for a tag, or `None` if the category lacks it.
    #[must_use]
    pub fn bit(&self, category: Category, tag: &str) -> Option<TagMask> {
        self.positions[category.index()]
            .get(tag)
            .map(|&position| 1 << position)
    }

    #[must_use]
    pub fn tag_count(&self, category: Category) -> usize {
        self.positions[category.index()].len()
    }

    #[must_use]
    pub fn character_masks(&self, character: &Character) -> CategoryMasks {
        let mut masks = CategoryMasks::default();
        for (category, tag) in character.tags.iter() {
            if let Some(bit) = self.bit(category, tag) {
                masks.insert(category, bit);
            }
        }
        masks
    }

    #[must_use]
    pub fn condition_mask(&self, condition: &Condition) -> ConditionMask {
        let mask = condition
            .any_of
            .iter()
            .filter_map(|tag| self.bit(condition.category, tag))
            .fold(0, |acc, bit| acc | bit);
        ConditionMask {
            category: condition.category,
            mask,
        }
    }

    #[must_use]
    pub fn condition_masks(&self, conditions: &[Condition]) -> Vec<ConditionMask> {
        conditions
            .iter()
            .map(|condition| self.condition_mask(condition))
            .collect()
    }
}
