use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Baseline role every client holds
pub const ROLE_USER: &str = "ROLE_USER";

/// An API account owning users
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Client {
    pub id: i64,
    pub email: String,
    /// Argon2id PHC string
    pub password: String,
    pub name: String,
    pub address: Option<String>,
    pub address_complement: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub creation_date: DateTime<Utc>,
    pub roles: Vec<String>,
}

impl Client {
    /// Stored roles plus `ROLE_USER`, deduplicated
    pub fn roles(&self) -> Vec<String> {
        let mut roles = self.roles.clone();
        if !roles.iter().any(|r| r == ROLE_USER) {
            roles.push(ROLE_USER.to_string());
        }
        roles.sort();
        roles.dedup();
        roles
    }

    pub fn has_role(&self, role: &str) -> bool {
        role == ROLE_USER || self.roles.iter().any(|r| r == role)
    }
}

/// Insert payload for a client; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewClientRecord {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub address: Option<String>,
    pub address_complement: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub roles: Vec<String>,
}

/// Client fields exposed alongside a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSummary {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub address: Option<String>,
    pub address_complement: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub creation_date: DateTime<Utc>,
}

impl From<&Client> for ClientSummary {
    fn from(client: &Client) -> Self {
        Self {
            id: client.id,
            email: client.email.clone(),
            name: client.name.clone(),
            address: client.address.clone(),
            address_complement: client.address_complement.clone(),
            postal_code: client.postal_code.clone(),
            city: client.city.clone(),
            creation_date: client.creation_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(roles: Vec<&str>) -> Client {
        Client {
            id: 1,
            email: "client1@test.fr".into(),
            password: "$argon2id$...".into(),
            name: "ClientName1".into(),
            address: None,
            address_complement: None,
            postal_code: None,
            city: None,
            creation_date: Utc::now(),
            roles: roles.into_iter().map(String::from).collect(),
        }
    }

    #[test]
    fn test_role_user_is_always_granted() {
        let c = client(vec![]);
        assert!(c.has_role(ROLE_USER));
        assert_eq!(c.roles(), vec![ROLE_USER.to_string()]);
    }

    #[test]
    fn test_roles_are_deduplicated() {
        let c = client(vec!["ROLE_ADMIN", "ROLE_USER"]);
        assert_eq!(c.roles(), vec!["ROLE_ADMIN".to_string(), "ROLE_USER".to_string()]);
        assert!(c.has_role("ROLE_ADMIN"));
        assert!(!c.has_role("ROLE_SUPER_ADMIN"));
    }

    #[test]
    fn test_summary_never_carries_password() {
        let json = serde_json::to_value(ClientSummary::from(&client(vec![]))).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("roles").is_none());
        assert_eq!(json["email"], "client1@test.fr");
    }
}
