use serde::Deserialize;

/// Body of post creation and edits.
#[derive(Debug, Deserialize)]
pub struct PostRequest {
    #[serde(default)]
    pub titulo: String,
    #[serde(default)]
    pub conteudo: String,
}
