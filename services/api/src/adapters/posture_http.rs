//! services/api/src/adapters/posture_http.rs
//!
//! Reads the tilt angle from the posture sensor's HTTP endpoint.
//! The sensor answers `GET /posture` with `{"angle": <degrees>}`.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use study_buddy_core::ports::{PortError, PortResult, PostureSensor};

#[derive(Deserialize)]
struct PostureReading {
    angle: f64,
}

/// An adapter that implements `PostureSensor` over plain HTTP.
#[derive(Clone)]
pub struct HttpPostureSensor {
    client: reqwest::Client,
    url: String,
}

impl HttpPostureSensor {
    pub fn new(url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("study-buddy-api")
            .build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl PostureSensor for HttpPostureSensor {
    async fn read_angle(&self) -> PortResult<f64> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| PortError::Unavailable(e.to_string()))?;

        let response = response
            .error_for_status()
            .map_err(|e| PortError::Unavailable(e.to_string()))?;

        let reading: PostureReading = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("Malformed posture reading: {}", e)))?;

        Ok(reading.angle)
    }
}
