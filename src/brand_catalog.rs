//! Brand Catalog
//!
//! Static per-vendor connection defaults used to fill in unspecified device
//! fields and to synthesize stream/control addresses. The table is a
//! process-wide constant; unknown brand names resolve to the designated
//! default profile so lookups are total.

use serde::{Deserialize, Serialize};

/// Stream addressing convention for a brand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolKind {
    /// Plain RTSP path, usable as-is
    RawStream,
    /// ONVIF media-profile convention; the media path template carries a
    /// `{profile}` placeholder filled with the brand's profile token
    ManagedProfile,
}

/// Static per-brand connection defaults
#[derive(Debug, Clone, Serialize)]
pub struct BrandProfile {
    pub name: &'static str,
    pub default_media_port: u16,
    pub default_control_port: u16,
    pub media_path_template: &'static str,
    pub control_path_template: &'static str,
    pub default_username: &'static str,
    pub ptz_support: bool,
    pub protocol: ProtocolKind,
    pub profile_name: &'static str,
    pub common_models: &'static [&'static str],
}

/// Catalog, in declaration order. The first entry is the fallback profile
/// for unknown brand names.
const BRANDS: &[BrandProfile] = &[
    BrandProfile {
        name: "Vivotek",
        default_media_port: 554,
        default_control_port: 80,
        media_path_template: "/live.sdp",
        control_path_template: "/onvif/device_service",
        default_username: "admin",
        ptz_support: true,
        protocol: ProtocolKind::RawStream,
        profile_name: "profile_1",
        common_models: &["IB9367-HT", "IB9389-HT", "FD9389-HTV", "IP9181-H"],
    },
    BrandProfile {
        name: "Axis",
        default_media_port: 554,
        default_control_port: 80,
        media_path_template: "/axis-media/media.amp?videocodec=h264",
        control_path_template: "/onvif/device_service",
        default_username: "root",
        ptz_support: true,
        protocol: ProtocolKind::RawStream,
        profile_name: "profile_1",
        common_models: &["P3245-LV", "M3046-V", "P1455-LE", "Q6055-E"],
    },
    BrandProfile {
        name: "Hikvision",
        default_media_port: 554,
        default_control_port: 80,
        media_path_template: "/Streaming/Channels/101",
        control_path_template: "/onvif/device_service",
        default_username: "admin",
        ptz_support: true,
        protocol: ProtocolKind::RawStream,
        profile_name: "profile_1",
        common_models: &["DS-2CD2385FWD-I", "DS-2DE4A425IW-DE", "DS-2CD2143G0-IS"],
    },
    BrandProfile {
        name: "Dahua",
        default_media_port: 554,
        default_control_port: 80,
        media_path_template: "/cam/realmonitor?channel=1&subtype=0",
        control_path_template: "/onvif/device_service",
        default_username: "admin",
        ptz_support: true,
        protocol: ProtocolKind::RawStream,
        profile_name: "profile_1",
        common_models: &["IPC-HFW4431R-Z", "SD59225U-HNI", "IPC-HDBW4431R-AS"],
    },
    BrandProfile {
        name: "Tapo",
        default_media_port: 554,
        default_control_port: 2020,
        media_path_template: "/{profile}",
        control_path_template: "/onvif/device_service",
        default_username: "admin",
        ptz_support: true,
        protocol: ProtocolKind::ManagedProfile,
        profile_name: "stream1",
        common_models: &["C200", "C210", "C500", "TC70"],
    },
];

/// Resolve a brand name to its profile. Case-insensitive; unknown names map
/// to the default profile rather than failing.
pub fn resolve_brand(name: &str) -> &'static BrandProfile {
    BRANDS
        .iter()
        .find(|b| b.name.eq_ignore_ascii_case(name))
        .unwrap_or(&BRANDS[0])
}

/// Brand names in catalog declaration order (drives selection UIs)
pub fn list_brands() -> Vec<&'static str> {
    BRANDS.iter().map(|b| b.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_brand() {
        let profile = resolve_brand("Axis");
        assert_eq!(profile.name, "Axis");
        assert_eq!(profile.default_username, "root");
        assert_eq!(profile.default_media_port, 554);
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        assert_eq!(resolve_brand("hikvision").name, "Hikvision");
        assert_eq!(resolve_brand("TAPO").name, "Tapo");
    }

    #[test]
    fn test_unknown_brand_falls_back_to_default() {
        let profile = resolve_brand("UnknownBrand");
        assert_eq!(profile.name, "Vivotek");
        assert_eq!(profile.media_path_template, "/live.sdp");
    }

    #[test]
    fn test_list_brands_declaration_order() {
        assert_eq!(
            list_brands(),
            vec!["Vivotek", "Axis", "Hikvision", "Dahua", "Tapo"]
        );
    }

    #[test]
    fn test_managed_profile_brand_has_placeholder() {
        let profile = resolve_brand("Tapo");
        assert_eq!(profile.protocol, ProtocolKind::ManagedProfile);
        assert!(profile.media_path_template.contains("{profile}"));
    }
}
