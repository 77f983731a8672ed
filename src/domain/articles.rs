use cafe_api_types::NewArticle;

use super::error::DomainError;

const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleDraft {
    pub title: String,
    pub description: Option<String>,
    pub body: String,
    pub published: bool,
}

impl ArticleDraft {
    pub fn validate(input: NewArticle) -> Result<Self, DomainError> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(DomainError::validation("article title must not be empty"));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(DomainError::validation(format!(
                "article title must be at most {MAX_TITLE_LEN} characters"
            )));
        }
        if input.body.trim().is_empty() {
            return Err(DomainError::validation("article body must not be empty"));
        }

        let description = input
            .description
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Ok(Self {
            title: title.to_string(),
            description,
            body: input.body,
            published: input.published,
        })
    }
}
