//! Shopping-list aggregation over meal survey responses.
//!
//! Array-valued answers are counted into frequency tables so organizers can
//! see at a glance what to buy.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::models::{
    DrinkType, MealPreferenceWithMember, Member, ALCOHOL_AMOUNT_OPTIONS, ALCOHOL_OPTIONS,
    FOOD_CATEGORY_OPTIONS, SOFT_DRINK_OPTIONS,
};

/// Shown where a response has lost its member.
pub const UNKNOWN_MEMBER: &str = "不明なユーザー";

/// One row of a frequency table.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FrequencyEntry {
    pub item: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct DrinkTypeCounts {
    pub soft: usize,
    pub alcohol: usize,
    pub unset: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AllergyNote {
    pub name: String,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FoodRequestNote {
    pub name: String,
    pub text: String,
}

/// Aggregated view for the organizers' shopping list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealSummary {
    pub respondents: usize,
    pub total_members: usize,
    pub unanswered: Vec<String>,
    pub drink_types: DrinkTypeCounts,
    pub alcohols: Vec<FrequencyEntry>,
    pub soft_drinks: Vec<FrequencyEntry>,
    pub alcohol_amounts: Vec<FrequencyEntry>,
    pub food_categories: Vec<FrequencyEntry>,
    pub allergies: Vec<AllergyNote>,
    pub food_requests: Vec<FoodRequestNote>,
}

/// Build the summary. `members` is the full roster, used for the unanswered list.
pub fn summarize(preferences: &[MealPreferenceWithMember], members: &[Member]) -> MealSummary {
    let mut drink_types = DrinkTypeCounts::default();
    let mut allergies = Vec::new();
    let mut food_requests = Vec::new();

    for entry in preferences {
        let pref = &entry.preference;
        let name = entry.member_name.as_deref().unwrap_or(UNKNOWN_MEMBER);

        match pref.drink_type {
            Some(DrinkType::Soft) => drink_types.soft += 1,
            Some(DrinkType::Alcohol) => drink_types.alcohol += 1,
            None => drink_types.unset += 1,
        }

        if pref.has_allergy {
            allergies.push(AllergyNote {
                name: name.to_string(),
                details: pref.allergy_details.clone(),
            });
        }

        if let Some(text) = pref.food_request.as_deref().map(str::trim) {
            if !text.is_empty() {
                food_requests.push(FoodRequestNote {
                    name: name.to_string(),
                    text: text.to_string(),
                });
            }
        }
    }

    let answered: HashSet<&str> = preferences
        .iter()
        .map(|p| p.preference.member_id.as_str())
        .collect();
    let mut unanswered: Vec<String> = members
        .iter()
        .filter(|m| !answered.contains(m.id.as_str()))
        .map(|m| m.name.clone())
        .collect();
    unanswered.sort();

    MealSummary {
        respondents: preferences.len(),
        total_members: members.len(),
        unanswered,
        drink_types,
        alcohols: frequency_table(
            preferences
                .iter()
                .flat_map(|p| p.preference.favorite_alcohols.iter().map(String::as_str)),
            &ALCOHOL_OPTIONS,
        ),
        soft_drinks: frequency_table(
            preferences
                .iter()
                .flat_map(|p| p.preference.favorite_soft_drinks.iter().map(String::as_str)),
            &SOFT_DRINK_OPTIONS,
        ),
        alcohol_amounts: frequency_table(
            preferences
                .iter()
                .filter_map(|p| p.preference.alcohol_amount.as_deref()),
            &ALCOHOL_AMOUNT_OPTIONS,
        ),
        food_categories: frequency_table(
            preferences
                .iter()
                .flat_map(|p| p.preference.food_categories.iter().map(String::as_str)),
            &FOOD_CATEGORY_OPTIONS,
        ),
        allergies,
        food_requests,
    }
}

/// Count occurrences, most frequent first. Ties follow catalogue order, then name.
pub fn frequency_table<'a>(
    values: impl IntoIterator<Item = &'a str>,
    catalogue: &[&str],
) -> Vec<FrequencyEntry> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    let rank = |item: &str| {
        catalogue
            .iter()
            .position(|c| *c == item)
            .unwrap_or(catalogue.len())
    };

    let mut table: Vec<(&str, usize)> = counts.into_iter().collect();
    table.sort_by_key(|(item, count)| (Reverse(*count), rank(*item), *item));

    table
        .into_iter()
        .map(|(item, count)| FrequencyEntry {
            item: item.to_string(),
            count,
        })
        .collect()
}
