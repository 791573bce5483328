//! Meal and drink survey model.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub const ALCOHOL_OPTIONS: [&str; 6] = [
    "ビール",
    "レモンサワー",
    "ハイボール",
    "梅酒",
    "カクテル",
    "その他",
];

pub const SOFT_DRINK_OPTIONS: [&str; 6] = [
    "お茶",
    "コーラ",
    "オレンジ・リンゴ",
    "カルピス",
    "炭酸水",
    "コーヒー・紅茶",
];

pub const ALCOHOL_AMOUNT_OPTIONS: [&str; 2] = ["ほどほどに", "たくさん！"];

pub const FOOD_CATEGORY_OPTIONS: [&str; 5] = [
    "ホットスナック",
    "サラダ・さっぱり系",
    "スイーツ",
    "アイス",
    "特定のお菓子",
];

/// Drink branch chosen on the survey.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DrinkType {
    Soft,
    Alcohol,
}

impl DrinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrinkType::Soft => "soft",
            DrinkType::Alcohol => "alcohol",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "soft" => Some(DrinkType::Soft),
            "alcohol" => Some(DrinkType::Alcohol),
            _ => None,
        }
    }
}

/// Choices offered by the survey screen.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealOptions {
    pub drink_types: Vec<DrinkType>,
    pub alcohols: Vec<&'static str>,
    pub soft_drinks: Vec<&'static str>,
    pub alcohol_amounts: Vec<&'static str>,
    pub food_categories: Vec<&'static str>,
}

impl MealOptions {
    pub fn catalogue() -> Self {
        Self {
            drink_types: vec![DrinkType::Soft, DrinkType::Alcohol],
            alcohols: ALCOHOL_OPTIONS.to_vec(),
            soft_drinks: SOFT_DRINK_OPTIONS.to_vec(),
            alcohol_amounts: ALCOHOL_AMOUNT_OPTIONS.to_vec(),
            food_categories: FOOD_CATEGORY_OPTIONS.to_vec(),
        }
    }
}

/// Stored survey response, one per member.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPreference {
    pub member_id: String,
    pub has_allergy: bool,
    pub allergy_details: Option<String>,
    pub drink_type: Option<DrinkType>,
    pub favorite_alcohols: Vec<String>,
    pub favorite_soft_drinks: Vec<String>,
    pub alcohol_amount: Option<String>,
    pub food_categories: Vec<String>,
    pub food_request: Option<String>,
    pub updated_at: String,
}

/// Survey response joined with the respondent's full name.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPreferenceWithMember {
    #[serde(flatten)]
    pub preference: MealPreference,
    /// `None` only if the member row vanished mid-query
    pub member_name: Option<String>,
}

/// Request body for saving the survey.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveMealPreferenceRequest {
    #[serde(default)]
    pub has_allergy: bool,
    #[serde(default)]
    pub allergy_details: Option<String>,
    #[serde(default)]
    pub drink_type: Option<String>,
    #[serde(default)]
    pub favorite_alcohols: Vec<String>,
    #[serde(default)]
    pub favorite_soft_drinks: Vec<String>,
    #[serde(default)]
    pub alcohol_amount: Option<String>,
    #[serde(default)]
    pub food_categories: Vec<String>,
    #[serde(default)]
    pub food_request: Option<String>,
}

/// Survey answer after validation, ready to upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealPreferenceInput {
    pub has_allergy: bool,
    pub allergy_details: Option<String>,
    pub drink_type: Option<DrinkType>,
    pub favorite_alcohols: Vec<String>,
    pub favorite_soft_drinks: Vec<String>,
    pub alcohol_amount: Option<String>,
    pub food_categories: Vec<String>,
    pub food_request: Option<String>,
}

impl SaveMealPreferenceRequest {
    /// Validate against the catalogue and drop answers hidden by the chosen branch.
    ///
    /// Only the list matching the drink type survives: soft drinkers keep their
    /// soft drinks, drinkers keep alcohols and amount. Allergy details are kept
    /// only when the allergy flag is set.
    pub fn validate(self) -> Result<MealPreferenceInput, AppError> {
        let drink_type = match clean_text(self.drink_type) {
            None => None,
            Some(raw) => Some(DrinkType::parse(&raw).ok_or_else(|| {
                AppError::Validation(format!("Unknown drink type: {}", raw))
            })?),
        };

        let alcohols = pick_from("favoriteAlcohols", self.favorite_alcohols, &ALCOHOL_OPTIONS)?;
        let soft_drinks = pick_from(
            "favoriteSoftDrinks",
            self.favorite_soft_drinks,
            &SOFT_DRINK_OPTIONS,
        )?;
        let food_categories = pick_from(
            "foodCategories",
            self.food_categories,
            &FOOD_CATEGORY_OPTIONS,
        )?;

        let (favorite_alcohols, favorite_soft_drinks, alcohol_amount) = match drink_type {
            Some(DrinkType::Alcohol) => {
                let alcohol_amount = match clean_text(self.alcohol_amount) {
                    Some(amount) if !ALCOHOL_AMOUNT_OPTIONS.contains(&amount.as_str()) => {
                        return Err(AppError::Validation(format!(
                            "Unknown alcohol amount: {}",
                            amount
                        )));
                    }
                    other => other,
                };
                (alcohols, Vec::new(), alcohol_amount)
            }
            Some(DrinkType::Soft) => (Vec::new(), soft_drinks, None),
            None => (Vec::new(), Vec::new(), None),
        };

        let allergy_details = if self.has_allergy {
            clean_text(self.allergy_details)
        } else {
            None
        };

        Ok(MealPreferenceInput {
            has_allergy: self.has_allergy,
            allergy_details,
            drink_type,
            favorite_alcohols,
            favorite_soft_drinks,
            alcohol_amount,
            food_categories,
            food_request: clean_text(self.food_request),
        })
    }
}

/// Trim, reject items outside `catalogue`, and collapse repeats in first-seen order.
fn pick_from(
    field: &str,
    items: Vec<String>,
    catalogue: &[&str],
) -> Result<Vec<String>, AppError> {
    let mut picked: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim();
        if !catalogue.contains(&item) {
            return Err(AppError::Validation(format!(
                "{} contains unknown option: {}",
                field, item
            )));
        }
        if !picked.iter().any(|p| p == item) {
            picked.push(item.to_string());
        }
    }
    Ok(picked)
}

/// Trim free text; blank becomes `None`.
pub fn clean_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
