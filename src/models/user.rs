use serde::{Deserialize, Serialize};

/// A user record as served by the remote users API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub avatar: String,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// One page of users, as reported by `GET /users?page=N`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersPage {
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub total: u32,
    pub total_pages: u32,
    pub data: Vec<User>,
}

/// Partial user fields sent with `PUT /users/:id`.
/// Fields left as `None` are omitted from the request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl UserUpdate {
    /// Only the fields that differ between the stored row and its edited copy
    pub fn between(original: &User, edited: &User) -> Self {
        fn changed(before: &str, after: &str) -> Option<String> {
            (before != after).then(|| after.to_string())
        }

        UserUpdate {
            email: changed(&original.email, &edited.email),
            first_name: changed(&original.first_name, &edited.first_name),
            last_name: changed(&original.last_name, &edited.last_name),
            avatar: changed(&original.avatar, &edited.avatar),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.avatar.is_none()
    }
}

/// Editable fields of a row, as submitted by the inline edit form
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DraftFields {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_users_page_ignores_extra_fields() {
        let body = json!({
            "page": 2,
            "per_page": 6,
            "total": 12,
            "total_pages": 2,
            "data": [{
                "id": 7,
                "email": "michael.lawson@reqres.in",
                "first_name": "Michael",
                "last_name": "Lawson",
                "avatar": "https://reqres.in/img/faces/7-image.jpg"
            }],
            "support": { "url": "https://reqres.in/#support-heading", "text": "..." }
        });

        let page: UsersPage = serde_json::from_value(body).unwrap();
        assert_eq!(page.page, 2);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].full_name(), "Michael Lawson");
    }

    #[test]
    fn test_users_page_without_counts_still_decodes() {
        let body = json!({
            "page": 1,
            "total_pages": 1,
            "data": [{
                "id": 1,
                "email": "george.bluth@reqres.in",
                "first_name": "George",
                "last_name": "Bluth"
            }]
        });

        let page: UsersPage = serde_json::from_value(body).unwrap();
        assert_eq!(page.per_page, 0);
        assert_eq!(page.total, 0);
        assert_eq!(page.data[0].avatar, "");
    }

    #[test]
    fn test_update_omits_missing_fields() {
        let update = UserUpdate {
            first_name: Some("Janet".to_string()),
            ..Default::default()
        };

        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value, json!({ "first_name": "Janet" }));
    }

    #[test]
    fn test_update_between_keeps_changed_fields_only() {
        let original = User {
            id: 2,
            email: "janet.weaver@reqres.in".to_string(),
            first_name: "Janet".to_string(),
            last_name: "Weaver".to_string(),
            avatar: "https://reqres.in/img/faces/2-image.jpg".to_string(),
        };
        let mut edited = original.clone();
        edited.last_name = "Weaver-Smith".to_string();

        let update = UserUpdate::between(&original, &edited);
        assert_eq!(update.last_name.as_deref(), Some("Weaver-Smith"));
        assert!(update.first_name.is_none());
        assert!(update.email.is_none());
        assert!(UserUpdate::between(&original, &original).is_empty());
    }
}
