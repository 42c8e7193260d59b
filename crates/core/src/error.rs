#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {entity} {id}")]
    NotFound { entity: &'static str, id: String },

    /// A remote call failed; carried to observers as an `unknown` diagnostic.
    #[error("Transport failure: {0}")]
    Transport(String),
}
