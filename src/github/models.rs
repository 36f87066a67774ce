use serde::Deserialize;

pub const EVENT_HEADER: &str = "x-github-event";
pub const SIGNATURE_HEADER: &str = "x-hub-signature";
pub const DELIVERY_HEADER: &str = "x-github-delivery";

pub const PUSH_EVENT: &str = "push";

const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// Push webhook payload. Only the fields the dispatcher needs; everything
/// else in the delivery is ignored and missing fields decode as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PushEvent {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub before: String,
    pub after: String,
    pub repository: Repository,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub git_url: String,
    pub ssh_url: String,
    pub clone_url: String,
}

impl PushEvent {
    pub fn decode(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// Branch name from the ref (refs/heads/main -> main). Refs without the
    /// prefix are returned unchanged.
    pub fn branch(&self) -> &str {
        self.git_ref
            .strip_prefix(BRANCH_REF_PREFIX)
            .unwrap_or(&self.git_ref)
    }
}
