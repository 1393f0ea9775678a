use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShareError {
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Scheme '{scheme}' has {needed} nationality columns but the palette holds {available}")]
    PaletteExhausted {
        scheme: String,
        needed: usize,
        available: usize,
    },

    #[error("Chart rendering failed: {0}")]
    Render(String),
}
