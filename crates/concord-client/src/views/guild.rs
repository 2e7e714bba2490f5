//! Guild view.

use concord_types::{ApiGuild, BitField, BitFieldError, ImageOptions, PERMISSIONS};
use serde::Serialize;

/// A guild the user belongs to, with their permissions in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Guild {
    pub id: String,
    pub name: String,
    /// Icon hash.
    pub icon: Option<String>,
    /// Whether the user owns the guild.
    pub owner: bool,
    /// Raw permission mask.
    pub permissions: u64,
    /// Names of the granted permissions, in table order.
    pub permission_names: Vec<&'static str>,
    pub features: Vec<String>,
    pub approximate_member_count: Option<u64>,
}

impl Guild {
    /// The user's permissions as a bitfield.
    pub fn permission_set(&self) -> BitField {
        BitField::new(PERMISSIONS, self.permissions)
    }

    /// Check a permission by name, e.g. `"ADMINISTRATOR"`.
    pub fn has_permission(&self, name: &str) -> Result<bool, BitFieldError> {
        self.permission_set().has(name)
    }

    /// CDN link to the guild icon, if it has one.
    pub fn icon_url(&self, options: ImageOptions) -> Option<String> {
        self.icon
            .as_deref()
            .map(|hash| options.url("icons", &self.id, hash))
    }

    /// Whether the guild has a feature flag enabled, e.g. `"COMMUNITY"`.
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }
}

impl From<ApiGuild> for Guild {
    fn from(api: ApiGuild) -> Self {
        let permission_names = BitField::new(PERMISSIONS, api.permissions).to_vec();
        Self {
            id: api.id,
            name: api.name,
            icon: api.icon,
            owner: api.owner,
            permissions: api.permissions,
            permission_names,
            features: api.features,
            approximate_member_count: api.approximate_member_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_types::ImageFormat;

    fn api_guild(permissions: u64, icon: Option<&str>) -> ApiGuild {
        ApiGuild {
            id: "99".to_string(),
            name: "Test Guild".to_string(),
            icon: icon.map(str::to_string),
            owner: false,
            permissions,
            features: vec!["COMMUNITY".to_string()],
            approximate_member_count: None,
        }
    }

    #[test]
    fn test_permission_names() {
        // CREATE_INSTANT_INVITE | ADMINISTRATOR
        let guild = Guild::from(api_guild(0b1001, None));
        assert_eq!(
            guild.permission_names,
            vec!["CREATE_INSTANT_INVITE", "ADMINISTRATOR"]
        );
        assert!(guild.has_permission("ADMINISTRATOR").unwrap());
        assert!(!guild.has_permission("KICK_MEMBERS").unwrap());
        assert!(guild.has_permission("NOT_A_PERMISSION").is_err());
    }

    #[test]
    fn test_no_permissions() {
        let guild = Guild::from(api_guild(0, None));
        assert!(guild.permission_names.is_empty());
    }

    #[test]
    fn test_icon_url() {
        assert!(Guild::from(api_guild(0, None)).icon_url(ImageOptions::default()).is_none());

        let guild = Guild::from(api_guild(0, Some("abc")));
        assert_eq!(
            guild
                .icon_url(ImageOptions::default().with_format(ImageFormat::Webp).with_size(64))
                .unwrap(),
            "https://cdn.discordapp.com/icons/99/abc.webp?size=64"
        );
        assert!(guild.has_feature("COMMUNITY"));
    }
}
