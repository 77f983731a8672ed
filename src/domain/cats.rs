use cafe_api_types::NewCat;

use super::error::DomainError;

const MAX_NAME_LEN: usize = 80;
const MAX_AGE: i32 = 40;

/// A cat that passed validation and can be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatDraft {
    pub name: String,
    pub age: i32,
    pub breed: String,
}

impl CatDraft {
    pub fn validate(input: NewCat) -> Result<Self, DomainError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("cat name must not be empty"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(DomainError::validation(format!(
                "cat name must be at most {MAX_NAME_LEN} characters"
            )));
        }
        if !(0..=MAX_AGE).contains(&input.age) {
            return Err(DomainError::validation(format!(
                "cat age must be between 0 and {MAX_AGE}"
            )));
        }

        Ok(Self {
            name: name.to_string(),
            age: input.age,
            breed: input.breed.trim().to_string(),
        })
    }
}
