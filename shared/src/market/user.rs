use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::null_as_default;

/// `users/me` profile. Fields the service does not read are kept in
/// `extra` so the profile can be proxied and archived unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketUser {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MarketUser {
    /// Profile picture URL, when the marketplace sends one
    pub fn picture(&self) -> Option<&str> {
        self.extra
            .get("thumbnail")
            .and_then(|t| t.get("picture_url"))
            .or_else(|| self.extra.get("picture"))
            .and_then(Value::as_str)
    }
}

/// `users/{id}/items/search` response: listing ids only
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemSearchResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_unknown_fields() {
        let raw = json!({
            "id": 123456,
            "nickname": "LOJA_TESTE",
            "site_id": "MLB",
            "thumbnail": {"picture_url": "https://example.com/p.jpg"}
        });
        let user: MarketUser = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(user.id, 123456);
        assert_eq!(user.picture(), Some("https://example.com/p.jpg"));
        assert_eq!(serde_json::to_value(&user).unwrap(), raw);
    }
}
