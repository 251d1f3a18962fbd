use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Malformed token: {0}")]
    MalformedToken(#[from] jsonwebtoken::errors::Error),

    #[error("No token stored")]
    MissingToken,
}
