//! HTTP client for the Pi's device server.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Response, Url};

use crate::api::{
    ByteStream, DeviceApi, SwitchBody, SwitchState, BUTTON_ENDPOINT, DISTANCE_ENDPOINT,
    LCD_ENDPOINT, STREAM_ENDPOINT,
};
use crate::connection::DeviceAddress;
use crate::error::{ClientError, Result};
use crate::lcd::LcdPayload;

/// HTTP timeouts for the device connection.
///
/// The device sits on a local hotspot; anything slower than a couple of
/// seconds means it is gone, and the UI should say so instead of hanging.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// How long to wait for the TCP connection
    pub connect_timeout: Duration,
    /// Total deadline for command and poll requests
    pub request_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(2),
        }
    }
}

impl HttpConfig {
    /// Use the same value for connect and request deadlines.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            connect_timeout: timeout,
            request_timeout: timeout,
        }
    }
}

/// reqwest-backed [`DeviceApi`] implementation.
#[derive(Clone)]
pub struct DeviceClient {
    address: DeviceAddress,
    /// Client with request timeout for commands and polls
    http: reqwest::Client,
    /// Dedicated client for the event stream (no request timeout)
    streaming: reqwest::Client,
    lcd_url: Url,
    button_url: Url,
    distance_url: Url,
    stream_url: Url,
}

impl DeviceClient {
    /// Build a client for `address`.
    ///
    /// No request is made here; the device may be offline at start-up.
    pub fn new(address: &DeviceAddress, config: &HttpConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::from_reqwest("client", e))?;

        // The stream stays open indefinitely, so only the connect phase is bounded.
        let streaming = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| ClientError::from_reqwest("client", e))?;

        Ok(Self {
            lcd_url: address.endpoint(LCD_ENDPOINT)?,
            button_url: address.endpoint(BUTTON_ENDPOINT)?,
            distance_url: address.endpoint(DISTANCE_ENDPOINT)?,
            stream_url: address.endpoint(STREAM_ENDPOINT)?,
            address: address.clone(),
            http,
            streaming,
        })
    }

    /// Address this client talks to.
    #[must_use]
    pub fn address(&self) -> &DeviceAddress {
        &self.address
    }
}

/// Turn a non-2xx response into [`ClientError::Status`].
async fn ensure_success(endpoint: &'static str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        endpoint,
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl DeviceApi for DeviceClient {
    async fn send_lcd(&self, payload: &LcdPayload) -> Result<()> {
        tracing::debug!(
            endpoint = LCD_ENDPOINT,
            line1 = payload.line1(),
            line2 = payload.line2(),
            "Sending LCD text"
        );
        let response = self
            .http
            .post(self.lcd_url.clone())
            .json(payload)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(LCD_ENDPOINT, e))?;
        ensure_success(LCD_ENDPOINT, response).await?;
        Ok(())
    }

    async fn set_switch(&self, state: SwitchState) -> Result<()> {
        tracing::debug!(endpoint = BUTTON_ENDPOINT, state = state.as_u8(), "Setting switch");
        let response = self
            .http
            .post(self.button_url.clone())
            .json(&SwitchBody { state })
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(BUTTON_ENDPOINT, e))?;
        ensure_success(BUTTON_ENDPOINT, response).await?;
        Ok(())
    }

    async fn read_indicator(&self) -> Result<String> {
        let response = self
            .http
            .get(self.distance_url.clone())
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(DISTANCE_ENDPOINT, e))?;
        let response = ensure_success(DISTANCE_ENDPOINT, response).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::from_reqwest(DISTANCE_ENDPOINT, e))?;
        tracing::trace!(endpoint = DISTANCE_ENDPOINT, body = %body.trim(), "Polled indicator");
        Ok(body)
    }

    async fn open_stream(&self) -> Result<ByteStream> {
        tracing::debug!(url = %self.stream_url, "Opening event stream");
        let response = self
            .streaming
            .get(self.stream_url.clone())
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(STREAM_ENDPOINT, e))?;
        let response = ensure_success(STREAM_ENDPOINT, response).await?;

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| ClientError::from_reqwest(STREAM_ENDPOINT, e)))
            .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::AddressSource;

    #[test]
    fn test_endpoint_urls() {
        let addr = DeviceAddress::parse("pi.lan:8000", AddressSource::CommandLine).unwrap();
        let client = DeviceClient::new(&addr, &HttpConfig::default()).unwrap();
        assert_eq!(client.lcd_url.as_str(), "http://pi.lan:8000/lcd");
        assert_eq!(client.button_url.as_str(), "http://pi.lan:8000/button");
        assert_eq!(client.distance_url.as_str(), "http://pi.lan:8000/distance");
        assert_eq!(client.stream_url.as_str(), "http://pi.lan:8000/stream");
        assert_eq!(client.address(), &addr);
    }

    #[test]
    fn test_http_config_with_timeout() {
        let config = HttpConfig::with_timeout(Duration::from_millis(1500));
        assert_eq!(config.connect_timeout, Duration::from_millis(1500));
        assert_eq!(config.request_timeout, Duration::from_millis(1500));
    }
}
