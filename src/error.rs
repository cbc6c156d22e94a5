use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("no geolocation API key configured")]
    MissingApiKey,

    #[error("geolocation request failed: {0}")]
    Detect(#[source] reqwest::Error),

    #[error("geolocation response has unusable coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("no geocoding result for {0:?}")]
    CityNotFound(String),

    #[error("geocoding request failed: {0}")]
    Search(#[source] reqwest::Error),
}

impl LocateError {
    pub fn user_message(&self) -> &'static str {
        match self {
            LocateError::MissingApiKey
            | LocateError::Detect(_)
            | LocateError::InvalidCoordinates(_) => "Failed to detect location automatically",
            LocateError::CityNotFound(_) => "City not found",
            LocateError::Search(_) => "Failed to search city",
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("forecast request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("malformed forecast response: {0}")]
    Malformed(String),
}

impl FetchError {
    pub fn user_message(&self) -> &'static str {
        match self {
            FetchError::Request(_) => "Failed to fetch forecast data",
            FetchError::Malformed(_) => "Received an unexpected forecast response",
        }
    }
}

#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl PageError {
    pub fn user_message(&self) -> &'static str {
        match self {
            PageError::Locate(e) => e.user_message(),
            PageError::Fetch(e) => e.user_message(),
        }
    }
}
