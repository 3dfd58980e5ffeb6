use super::{dto::PostRequest, repo_types::PostInput};
use crate::error::ApiError;

const MAX_TITLE_CHARS: usize = 50;
const MAX_CONTENT_CHARS: usize = 300;

fn field(name: &str, value: &str, max: usize) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::BadRequest(format!("{name} is required")));
    }
    if value.chars().count() > max {
        return Err(ApiError::BadRequest(format!(
            "{name} must be at most {max} characters"
        )));
    }
    Ok(value.to_string())
}

/// Trims and validates a post body.
pub fn prepare_post(req: &PostRequest) -> Result<PostInput, ApiError> {
    Ok(PostInput {
        title: field("titulo", &req.titulo, MAX_TITLE_CHARS)?,
        content: field("conteudo", &req.conteudo, MAX_CONTENT_CHARS)?,
    })
}
