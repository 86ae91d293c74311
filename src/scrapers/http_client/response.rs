//! HTTP response wrapper.

use reqwest::{Response, StatusCode};

pub struct HttpResponse {
    pub status: StatusCode,
    pub(crate) response: Response,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub async fn text(self) -> Result<String, reqwest::Error> {
        self.response.text().await
    }
}
