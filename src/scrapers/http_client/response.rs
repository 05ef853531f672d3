//! HTTP response wrapper.

use reqwest::{Response, StatusCode};

/// HTTP response wrapper.
pub struct HttpResponse {
    pub status: StatusCode,
    response: Response,
}

impl HttpResponse {
    pub(crate) fn from_response(response: Response) -> Self {
        Self {
            status: response.status(),
            response,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body decoded with the declared charset.
    pub async fn text(self) -> Result<String, reqwest::Error> {
        self.response.text().await
    }
}
