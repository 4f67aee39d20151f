//! ONVIF PTZ handler
//!
//! SOAP PTZ transport using WS-Security UsernameToken authentication,
//! driven against a device's control service address. Works for any brand
//! whose control endpoint speaks the ONVIF PTZ service.
//!
//! Every move is bounded: ContinuousMove runs until Stop, so each command
//! issues the move and schedules an automatic Stop after the nudge
//! duration. Without it a single command would leave the camera panning
//! until its own watchdog fires.

use super::types::PtzHandler;
use crate::brand_catalog::resolve_brand;
use crate::device_registry::Device;
use crate::error::{Error, Result};
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use sha1::{Digest, Sha1};
use std::time::Duration;

const DEFAULT_NUDGE_MS: u64 = 500;

/// Generic ONVIF PTZ client
pub struct OnvifPtzHandler {
    client: Client,
    /// How long a move runs before the automatic Stop
    nudge: Duration,
}

impl OnvifPtzHandler {
    pub fn new() -> Self {
        Self::with_nudge_duration(DEFAULT_NUDGE_MS)
    }

    pub fn with_nudge_duration(nudge_ms: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            nudge: Duration::from_millis(nudge_ms),
        }
    }

    /// device_service endpoint -> ptz_service endpoint
    fn ptz_service_url(endpoint: &str) -> String {
        if endpoint.contains("/onvif/device_service") {
            endpoint.replace("/onvif/device_service", "/onvif/ptz_service")
        } else {
            let base = endpoint.trim_end_matches('/');
            match base.rfind('/') {
                Some(pos) => format!("{}/ptz_service", &base[..pos]),
                None => format!("{}/onvif/ptz_service", base),
            }
        }
    }

    fn credentials(device: &Device) -> Result<(&str, &str)> {
        let secret = device
            .credential_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                Error::Validation(format!(
                    "Camera {} has no credential configured for ONVIF PTZ",
                    device.id
                ))
            })?;
        Ok((device.username.as_str(), secret))
    }

    /// WS-Security UsernameToken header
    fn security_header(username: &str, password: &str) -> String {
        let nonce: [u8; 16] = rand::random();
        let nonce_base64 = base64::engine::general_purpose::STANDARD.encode(nonce);

        let created = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

        // Password Digest = Base64(SHA1(nonce + created + password))
        let mut hasher = Sha1::new();
        hasher.update(nonce);
        hasher.update(created.as_bytes());
        hasher.update(password.as_bytes());
        let digest = hasher.finalize();
        let digest_base64 = base64::engine::general_purpose::STANDARD.encode(digest);

        format!(
            r#"<s:Header>
    <Security xmlns="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd"
              s:mustUnderstand="true">
      <UsernameToken>
        <Username>{}</Username>
        <Password Type="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordDigest">{}</Password>
        <Nonce EncodingType="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary">{}</Nonce>
        <Created xmlns="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd">{}</Created>
      </UsernameToken>
    </Security>
  </s:Header>"#,
            username, digest_base64, nonce_base64, created
        )
    }

    /// Bounded move: ContinuousMove now, Stop after the nudge duration
    async fn nudge_move(&self, device: &Device, pan: f32, tilt: f32, zoom: f32) -> Result<()> {
        self.continuous_move(device, pan, tilt, zoom).await?;

        let client = self.client.clone();
        let device = device.clone();
        let nudge = self.nudge;
        tokio::spawn(async move {
            tokio::time::sleep(nudge).await;
            if let Err(e) = Self::stop(&client, &device).await {
                tracing::warn!(
                    camera_id = %device.id,
                    error = %e,
                    "Failed to auto-stop PTZ after nudge"
                );
            }
        });
        Ok(())
    }

    async fn continuous_move(&self, device: &Device, pan: f32, tilt: f32, zoom: f32) -> Result<()> {
        let (username, password) = Self::credentials(device)?;
        let profile_token = resolve_brand(&device.brand).profile_name;

        let soap_body = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"
            xmlns:tptz="http://www.onvif.org/ver20/ptz/wsdl"
            xmlns:tt="http://www.onvif.org/ver10/schema">
  {}
  <s:Body>
    <tptz:ContinuousMove>
      <tptz:ProfileToken>{}</tptz:ProfileToken>
      <tptz:Velocity>
        <tt:PanTilt x="{:.2}" y="{:.2}"/>
        <tt:Zoom x="{:.2}"/>
      </tptz:Velocity>
    </tptz:ContinuousMove>
  </s:Body>
</s:Envelope>"#,
            Self::security_header(username, password),
            profile_token,
            pan,
            tilt,
            zoom
        );

        Self::send_soap_request(&self.client, device, &soap_body, "ContinuousMove").await
    }

    /// Halts pan/tilt and zoom. Associated so the spawned auto-stop can
    /// run it without borrowing the handler.
    async fn stop(client: &Client, device: &Device) -> Result<()> {
        let (username, password) = Self::credentials(device)?;
        let profile_token = resolve_brand(&device.brand).profile_name;
        let soap_body =
            Self::stop_body(&Self::security_header(username, password), profile_token);
        Self::send_soap_request(client, device, &soap_body, "Stop").await
    }

    fn stop_body(security_header: &str, profile_token: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"
            xmlns:tptz="http://www.onvif.org/ver20/ptz/wsdl">
  {}
  <s:Body>
    <tptz:Stop>
      <tptz:ProfileToken>{}</tptz:ProfileToken>
      <tptz:PanTilt>true</tptz:PanTilt>
      <tptz:Zoom>true</tptz:Zoom>
    </tptz:Stop>
  </s:Body>
</s:Envelope>"#,
            security_header, profile_token
        )
    }

    async fn goto_home(&self, device: &Device) -> Result<()> {
        let (username, password) = Self::credentials(device)?;
        let profile_token = resolve_brand(&device.brand).profile_name;

        let soap_body = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"
            xmlns:tptz="http://www.onvif.org/ver20/ptz/wsdl">
  {}
  <s:Body>
    <tptz:GotoHomePosition>
      <tptz:ProfileToken>{}</tptz:ProfileToken>
    </tptz:GotoHomePosition>
  </s:Body>
</s:Envelope>"#,
            Self::security_header(username, password),
            profile_token
        );

        Self::send_soap_request(&self.client, device, &soap_body, "GotoHomePosition").await
    }

    async fn send_soap_request(
        client: &Client,
        device: &Device,
        body: &str,
        action: &str,
    ) -> Result<()> {
        let ptz_url = Self::ptz_service_url(&device.control_service_address);

        tracing::debug!(
            camera_id = %device.id,
            url = %ptz_url,
            action = %action,
            "Sending ONVIF PTZ request"
        );

        let response = client
            .post(&ptz_url)
            .header("Content-Type", "application/soap+xml; charset=utf-8")
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| Error::Network(format!("PTZ request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                camera_id = %device.id,
                status = %status,
                body = %body,
                "ONVIF PTZ request failed"
            );
            return Err(Error::Network(format!(
                "ONVIF PTZ {} failed with status {}: {}",
                action, status, body
            )));
        }

        tracing::info!(camera_id = %device.id, action = %action, "ONVIF PTZ command executed");
        Ok(())
    }
}

impl Default for OnvifPtzHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PtzHandler for OnvifPtzHandler {
    async fn pan(&self, device: &Device, speed: f32) -> Result<()> {
        self.nudge_move(device, speed, 0.0, 0.0).await
    }

    async fn tilt(&self, device: &Device, speed: f32) -> Result<()> {
        self.nudge_move(device, 0.0, speed, 0.0).await
    }

    async fn zoom_in(&self, device: &Device, speed: f32) -> Result<()> {
        self.nudge_move(device, 0.0, 0.0, speed).await
    }

    async fn zoom_out(&self, device: &Device, speed: f32) -> Result<()> {
        self.nudge_move(device, 0.0, 0.0, -speed).await
    }

    async fn home(&self, device: &Device) -> Result<()> {
        self.goto_home(device).await
    }
}
