//! Payload formatting
//!
//! Maps structured content to the literal text a QR symbol encodes. Values
//! are substituted verbatim with no escaping, so a `;` or a newline inside a
//! vCard or Wi-Fi field corrupts the output.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::constants::studio::URL_PLACEHOLDER;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QrType {
    Url,
    Text,
    Vcard,
    Wifi,
    Pdf,
    Social,
    App,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
pub enum WifiEncryption {
    #[default]
    #[serde(rename = "WPA")]
    #[value(name = "WPA")]
    Wpa,
    #[serde(rename = "WEP")]
    #[value(name = "WEP")]
    Wep,
    #[serde(rename = "nopass")]
    #[value(name = "nopass")]
    NoPass,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VCardData {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub company: String,
    pub title: String,
    pub website: String,
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiData {
    pub ssid: String,
    pub encryption: WifiEncryption,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub hidden: bool,
}

/// Structured content, tagged by its QR type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "qrType", content = "qrData", rename_all = "lowercase")]
pub enum QrContent {
    Url(String),
    Text(String),
    Vcard(VCardData),
    Wifi(WifiData),
    Pdf,
    Social,
    App,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("{0} payloads are not supported yet")]
    Unsupported(QrType),
}

impl QrType {
    pub const ALL: [QrType; 7] = [
        QrType::Url,
        QrType::Text,
        QrType::Vcard,
        QrType::Wifi,
        QrType::Pdf,
        QrType::Social,
        QrType::App,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QrType::Url => "url",
            QrType::Text => "text",
            QrType::Vcard => "vcard",
            QrType::Wifi => "wifi",
            QrType::Pdf => "pdf",
            QrType::Social => "social",
            QrType::App => "app",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, QrType::Pdf | QrType::Social | QrType::App)
    }

    /// Empty form for this type, used when the user switches types
    pub fn default_content(&self) -> QrContent {
        match self {
            QrType::Url => QrContent::Url(URL_PLACEHOLDER.to_string()),
            QrType::Text => QrContent::Text(String::new()),
            QrType::Vcard => QrContent::Vcard(VCardData::default()),
            QrType::Wifi => QrContent::Wifi(WifiData {
                password: Some(String::new()),
                ..WifiData::default()
            }),
            QrType::Pdf => QrContent::Pdf,
            QrType::Social => QrContent::Social,
            QrType::App => QrContent::App,
        }
    }
}

impl fmt::Display for QrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl WifiEncryption {
    pub const ALL: [WifiEncryption; 3] = [WifiEncryption::Wpa, WifiEncryption::Wep, WifiEncryption::NoPass];

    pub fn as_str(&self) -> &'static str {
        match self {
            WifiEncryption::Wpa => "WPA",
            WifiEncryption::Wep => "WEP",
            WifiEncryption::NoPass => "nopass",
        }
    }
}

impl QrContent {
    pub fn qr_type(&self) -> QrType {
        match self {
            QrContent::Url(_) => QrType::Url,
            QrContent::Text(_) => QrType::Text,
            QrContent::Vcard(_) => QrType::Vcard,
            QrContent::Wifi(_) => QrType::Wifi,
            QrContent::Pdf => QrType::Pdf,
            QrContent::Social => QrType::Social,
            QrContent::App => QrType::App,
        }
    }
}

/// Derive the payload string for `content`
pub fn format_payload(content: &QrContent) -> Result<String, PayloadError> {
    match content {
        QrContent::Url(text) | QrContent::Text(text) => Ok(text.clone()),
        QrContent::Vcard(card) => Ok(format_vcard(card)),
        QrContent::Wifi(wifi) => Ok(format_wifi(wifi)),
        QrContent::Pdf | QrContent::Social | QrContent::App => {
            Err(PayloadError::Unsupported(content.qr_type()))
        }
    }
}

pub fn format_vcard(data: &VCardData) -> String {
    [
        "BEGIN:VCARD".to_string(),
        "VERSION:3.0".to_string(),
        format!("N:{};{}", data.last_name, data.first_name),
        format!("FN:{} {}", data.first_name, data.last_name),
        format!("ORG:{}", data.company),
        format!("TITLE:{}", data.title),
        format!("TEL;TYPE=WORK,VOICE:{}", data.phone),
        format!("EMAIL:{}", data.email),
        format!("URL:{}", data.website),
        format!("ADR;TYPE=WORK:;;{}", data.address),
        "END:VCARD".to_string(),
    ]
    .join("\n")
}

pub fn format_wifi(data: &WifiData) -> String {
    let password = match data.password.as_deref() {
        Some(password) if data.encryption != WifiEncryption::NoPass && !password.is_empty() => {
            format!("P:{password};")
        }
        _ => String::new(),
    };
    let hidden = if data.hidden { "H:true;" } else { "" };
    format!(
        "WIFI:T:{};S:{};{password}{hidden};",
        data.encryption.as_str(),
        data.ssid
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> VCardData {
        VCardData {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone: "123".to_string(),
            email: "a@b.com".to_string(),
            company: "C".to_string(),
            title: "Engineer".to_string(),
            website: "w.co".to_string(),
            address: "Addr".to_string(),
        }
    }

    #[test]
    fn test_url_and_text_pass_through() {
        let url = QrContent::Url("https://example.com/?q=1;2".to_string());
        assert_eq!(format_payload(&url).unwrap(), "https://example.com/?q=1;2");
        let text = QrContent::Text("line one\nline two".to_string());
        assert_eq!(format_payload(&text).unwrap(), "line one\nline two");
    }

    #[test]
    fn test_vcard_fields() {
        let card = format_vcard(&ada());
        assert!(card.starts_with("BEGIN:VCARD\nVERSION:3.0\n"));
        assert!(card.ends_with("\nEND:VCARD"));
        assert!(card.contains("N:Lovelace;Ada"));
        assert!(card.contains("FN:Ada Lovelace"));
        assert!(card.contains("ORG:C"));
        assert!(card.contains("TITLE:Engineer"));
        assert!(card.contains("TEL;TYPE=WORK,VOICE:123"));
        assert!(card.contains("EMAIL:a@b.com"));
        assert!(card.contains("URL:w.co"));
        assert!(card.contains("ADR;TYPE=WORK:;;Addr"));
        assert_eq!(card.lines().count(), 11);
    }

    #[test]
    fn test_vcard_values_are_not_escaped() {
        let mut data = ada();
        data.company = "A;B".to_string();
        assert!(format_vcard(&data).contains("ORG:A;B"));
    }

    #[test]
    fn test_wifi_nopass_hidden() {
        let wifi = WifiData {
            ssid: "Home".to_string(),
            encryption: WifiEncryption::NoPass,
            password: None,
            hidden: true,
        };
        let payload = format_wifi(&wifi);
        assert_eq!(payload, "WIFI:T:nopass;S:Home;H:true;;");
        assert!(!payload.contains("P:"));
    }

    #[test]
    fn test_wifi_nopass_drops_leftover_password() {
        let wifi = WifiData {
            ssid: "Home".to_string(),
            encryption: WifiEncryption::NoPass,
            password: Some("abc".to_string()),
            hidden: false,
        };
        let payload = format_wifi(&wifi);
        assert_eq!(payload, "WIFI:T:nopass;S:Home;;");
        assert!(!payload.contains("P:"));
    }

    #[test]
    fn test_wifi_with_password() {
        let wifi = WifiData {
            ssid: "Office".to_string(),
            encryption: WifiEncryption::Wpa,
            password: Some("s3cret".to_string()),
            hidden: false,
        };
        assert_eq!(format_wifi(&wifi), "WIFI:T:WPA;S:Office;P:s3cret;;");
    }

    #[test]
    fn test_wifi_empty_password_omitted() {
        let wifi = WifiData {
            ssid: "Cafe".to_string(),
            encryption: WifiEncryption::Wep,
            password: Some(String::new()),
            hidden: false,
        };
        assert_eq!(format_wifi(&wifi), "WIFI:T:WEP;S:Cafe;;");
    }

    #[test]
    fn test_unsupported_types() {
        for content in [QrContent::Pdf, QrContent::Social, QrContent::App] {
            let kind = content.qr_type();
            assert_eq!(format_payload(&content), Err(PayloadError::Unsupported(kind)));
            assert!(!kind.is_supported());
        }
    }

    #[test]
    fn test_default_content_matches_type() {
        for kind in QrType::ALL {
            assert_eq!(kind.default_content().qr_type(), kind);
        }
        assert_eq!(
            QrType::Wifi.default_content(),
            QrContent::Wifi(WifiData {
                ssid: String::new(),
                encryption: WifiEncryption::Wpa,
                password: Some(String::new()),
                hidden: false,
            })
        );
    }

    #[test]
    fn test_content_json_is_tagged_by_type() {
        let json = serde_json::to_value(QrContent::Url("https://a.b".to_string())).unwrap();
        assert_eq!(json["qrType"], "url");
        assert_eq!(json["qrData"], "https://a.b");

        let wifi: QrContent = serde_json::from_str(
            r#"{"qrType":"wifi","qrData":{"ssid":"Home","encryption":"nopass","hidden":true}}"#,
        )
        .unwrap();
        assert_eq!(wifi.qr_type(), QrType::Wifi);
    }
}
