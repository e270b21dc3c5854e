//! Request payload types for the LabRig API.

use serde::{Deserialize, Serialize};

/// Machine registration payload. Also the entry shape of the YAML documents
/// accepted by `labrig register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineCreate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
}

impl MachineCreate {
    /// Whether every required field is present. Incomplete entries in a
    /// batch register file are skipped, not fatal.
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty()
            && !self.host.is_empty()
            && self.port > 0
            && !self.user.is_empty()
            && !self.password.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserCreate {
    pub username: String,
    pub password: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserSignup {
    pub username: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_completeness() {
        let m: MachineCreate = serde_yaml::from_str(
            "name: node1\nhost: 10.0.0.5\nport: 22\nuser: root\npassword: hunter2\n",
        )
        .expect("parse");
        assert!(m.is_complete());

        let partial: MachineCreate =
            serde_yaml::from_str("name: node2\nhost: 10.0.0.6\n").expect("parse");
        assert!(!partial.is_complete());
    }

    #[test]
    fn test_user_create_serializes_admin_flag() {
        let u = UserCreate {
            username: "alice".to_string(),
            password: "pw".to_string(),
            is_admin: true,
        };
        let json = serde_json::to_string(&u).expect("serialize");
        assert!(json.contains("\"is_admin\":true"));
    }
}
