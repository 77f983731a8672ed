use std::collections::HashSet;

use cafe_api_types::{CoffeePatch, NewCoffee};

use super::error::DomainError;

const MAX_FIELD_LEN: usize = 120;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoffeeDraft {
    pub name: String,
    pub brand: String,
    pub flavors: Vec<String>,
}

impl CoffeeDraft {
    pub fn validate(input: NewCoffee) -> Result<Self, DomainError> {
        Ok(Self {
            name: required_text("name", &input.name)?,
            brand: required_text("brand", &input.brand)?,
            flavors: normalize_flavors(input.flavors),
        })
    }
}

/// Validated partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoffeeChanges {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub flavors: Option<Vec<String>>,
}

impl CoffeeChanges {
    pub fn validate(input: CoffeePatch) -> Result<Self, DomainError> {
        Ok(Self {
            name: input
                .name
                .map(|name| required_text("name", &name))
                .transpose()?,
            brand: input
                .brand
                .map(|brand| required_text("brand", &brand))
                .transpose()?,
            flavors: input.flavors.map(normalize_flavors),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.brand.is_none() && self.flavors.is_none()
    }
}

/// Score given to a coffee, 1 through 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingScore(u8);

impl RatingScore {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;
    const RECOMMEND_AT: u8 = 4;

    pub fn new(score: u8) -> Result<Self, DomainError> {
        if (Self::MIN..=Self::MAX).contains(&score) {
            Ok(Self(score))
        } else {
            Err(DomainError::validation(format!(
                "score must be between {} and {}",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn recommends(self) -> bool {
        self.0 >= Self::RECOMMEND_AT
    }
}

fn required_text(field: &'static str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!(
            "coffee {field} must not be empty"
        )));
    }
    if trimmed.chars().count() > MAX_FIELD_LEN {
        return Err(DomainError::validation(format!(
            "coffee {field} must be at most {MAX_FIELD_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Trim, drop blanks, and de-duplicate case-insensitively keeping first spelling.
pub fn normalize_flavors(flavors: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    flavors
        .into_iter()
        .filter_map(|flavor| {
            let trimmed = flavor.trim();
            (!trimmed.is_empty() && seen.insert(trimmed.to_lowercase()))
                .then(|| trimmed.to_string())
        })
        .collect()
}
