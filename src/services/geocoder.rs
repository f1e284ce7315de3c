use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::models::Geolocation;

/// Errors that can occur when geocoding
#[derive(Debug, Error)]
pub enum GeocoderError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("No result for: {0}")]
    NotFound(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Client for the geocoding provider.
///
/// Talks to a Nominatim-compatible search endpoint and extracts GPS
/// coordinates from the first result. Callers are expected to cache:
/// postal codes do not move.
pub struct GeocoderClient {
    base_url: String,
    user_agent: String,
    country: String,
    client: Client,
}

impl GeocoderClient {
    /// Create a new geocoder client
    pub fn new(base_url: String, user_agent: String, country: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            user_agent,
            country,
            client,
        }
    }

    /// Geolocate a postal code, i.e. return its GPS coordinates.
    pub async fn geocode_postal_code(
        &self,
        postal_code: &str,
    ) -> Result<Geolocation, GeocoderError> {
        let url = format!(
            "{}/search?postalcode={}&country={}&format=json&limit=1",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(postal_code),
            urlencoding::encode(&self.country),
        );

        self.fetch_first_result(&url, postal_code).await
    }

    /// Geolocate a free-form address.
    pub async fn geocode_address(&self, address: &str) -> Result<Geolocation, GeocoderError> {
        let url = format!(
            "{}/search?q={}&format=json&limit=1",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(address),
        );

        self.fetch_first_result(&url, address).await
    }

    async fn fetch_first_result(
        &self,
        url: &str,
        query: &str,
    ) -> Result<Geolocation, GeocoderError> {
        tracing::debug!("Geocoding via: {}", url);

        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeocoderError::ApiError(format!(
                "Geocoding request failed: {}",
                response.status()
            )));
        }

        let json: Value = response.json().await?;

        let results = json
            .as_array()
            .ok_or_else(|| GeocoderError::InvalidResponse("Expected a result array".into()))?;

        let first = results
            .first()
            .ok_or_else(|| GeocoderError::NotFound(query.to_string()))?;

        // The provider returns coordinates as decimal strings
        let lat = coordinate(first, "lat")?;
        let lon = coordinate(first, "lon")?;

        Ok(Geolocation { lat, lon })
    }
}

fn coordinate(result: &Value, field: &str) -> Result<f64, GeocoderError> {
    let value = result
        .get(field)
        .ok_or_else(|| GeocoderError::InvalidResponse(format!("Missing {} field", field)))?;

    match value {
        Value::String(s) => s
            .parse::<f64>()
            .map_err(|_| GeocoderError::InvalidResponse(format!("Unparseable {}: {}", field, s))),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| GeocoderError::InvalidResponse(format!("Unparseable {}", field))),
        _ => Err(GeocoderError::InvalidResponse(format!(
            "Unexpected {} type",
            field
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: String) -> GeocoderClient {
        GeocoderClient::new(base_url, "famille-search-tests".to_string(), "France".to_string())
    }

    #[test]
    fn test_coordinate_parsing() {
        let result = serde_json::json!({"lat": "48.8566", "lon": 2.3522});
        assert!((coordinate(&result, "lat").unwrap() - 48.8566).abs() < 1e-9);
        assert!((coordinate(&result, "lon").unwrap() - 2.3522).abs() < 1e-9);

        let bad = serde_json::json!({"lat": "north"});
        assert!(coordinate(&bad, "lat").is_err());
        assert!(coordinate(&bad, "lon").is_err());
    }

    #[tokio::test]
    async fn test_geocode_postal_code() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("postalcode".into(), "75011".into()),
                mockito::Matcher::UrlEncoded("country".into(), "France".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"lat": "48.8594", "lon": "2.3765"}]"#)
            .create_async()
            .await;

        let client = test_client(server.url());
        let geoloc = client.geocode_postal_code("75011").await.unwrap();

        mock.assert_async().await;
        assert!((geoloc.lat - 48.8594).abs() < 1e-9);
        assert!((geoloc.lon - 2.3765).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_geocode_no_result_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let client = test_client(server.url());
        let result = client.geocode_postal_code("00000").await;

        assert!(matches!(result, Err(GeocoderError::NotFound(_))));
    }
}
