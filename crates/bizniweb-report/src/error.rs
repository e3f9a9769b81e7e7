use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("order {order_id}: no conversion rate for currency {currency}")]
    UnknownCurrency { order_id: String, currency: String },

    #[error("order {order_id}: unparseable purchase date '{value}'")]
    InvalidPurchaseDate { order_id: String, value: String },

    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write CSV {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("failed to render HTML report: {0}")]
    Render(#[from] askama::Error),
}
