use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

pub const WORKFLOW_ID_MIN_LEN: usize = 8;
pub const NODE_ID_LEN: usize = 36;

pub fn validate_workflow_id_value(value: &str) -> Result<(), String> {
    if value.len() < WORKFLOW_ID_MIN_LEN {
        return Err(format!(
            "workflow id must be at least {WORKFLOW_ID_MIN_LEN} characters"
        ));
    }
    if value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        return Ok(());
    }
    Err("workflow id must use only ASCII letters, digits, '-' or '_'".to_string())
}

pub fn validate_node_id_value(value: &str) -> Result<(), String> {
    if value.len() != NODE_ID_LEN {
        return Err(format!("node id must be exactly {NODE_ID_LEN} characters"));
    }
    if value.chars().all(|ch| ch.is_ascii_hexdigit() || ch == '-') {
        return Ok(());
    }
    Err("node id must use only hex digits or '-'".to_string())
}

pub fn is_valid_workflow_id(value: &str) -> bool {
    validate_workflow_id_value(value).is_ok()
}

pub fn is_valid_node_id(value: &str) -> bool {
    validate_node_id_value(value).is_ok()
}

macro_rules! define_id_type {
    ($name:ident, $kind:literal, $validate:path) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn parse(raw: &str) -> Result<Self, String> {
                $validate(raw).map_err(|err| format!("invalid {} `{}`: {}", $kind, raw, err))?;
                Ok(Self(raw.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                self.as_str()
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::parse(&raw).map_err(D::Error::custom)
            }
        }
    };
}

define_id_type!(WorkflowId, "workflow id", validate_workflow_id_value);
define_id_type!(NodeId, "node id", validate_node_id_value);
