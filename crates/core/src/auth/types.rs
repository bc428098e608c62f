use serde::{Deserialize, Serialize};

/// Signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_serialization() {
        let user = User {
            id: 1,
            name: "Demo User".to_string(),
            email: "demo@example.com".to_string(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert_eq!(
            json,
            r#"{"id":1,"name":"Demo User","email":"demo@example.com"}"#
        );
        let deserialized: User = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, user);
    }
}
