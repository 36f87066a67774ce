use std::collections::HashMap;

/// Repository key one-level configuration sources are filed under.
pub const WILDCARD_REPO: &str = "*";

/// branch name -> script to run when that branch is pushed
pub type BranchScriptMap = HashMap<String, String>;

/// repository full name (`owner/repo`) or `*` -> branch mapping
pub type RepoConfig = HashMap<String, BranchScriptMap>;

/// Overlay `incoming` onto `base`.
///
/// Repositories already present in `base` get their branches merged one by
/// one, with `incoming` winning on the same branch. New repositories are
/// adopted wholesale. Nothing is ever removed.
pub fn merge(base: &mut RepoConfig, incoming: RepoConfig) {
    for (repo, branches) in incoming {
        match base.get_mut(&repo) {
            Some(existing) => existing.extend(branches),
            None => {
                base.insert(repo, branches);
            }
        }
    }
}

/// Decode one configuration source.
///
/// The two-level `{repo: {branch: script}}` shape is tried first. If the data
/// does not fit it, the one-level `{branch: script}` shape is tried and filed
/// under the wildcard repository. The error of the second attempt is the one
/// reported.
pub fn parse_source(data: &[u8]) -> Result<RepoConfig, serde_json::Error> {
    if let Ok(repos) = serde_json::from_slice::<RepoConfig>(data) {
        return Ok(repos);
    }

    let branches: BranchScriptMap = serde_json::from_slice(data)?;
    let mut repos = RepoConfig::new();
    repos.insert(WILDCARD_REPO.to_string(), branches);
    Ok(repos)
}

/// Merged repository/branch -> script mapping.
///
/// Assembled once before the listener starts, then shared read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigStore {
    repos: RepoConfig,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge another layer on top of the current one.
    pub fn merge(&mut self, incoming: RepoConfig) {
        merge(&mut self.repos, incoming);
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    /// Branch mapping for a repository. Only the exact key matches; the
    /// `*` entry is just another key.
    pub fn repo(&self, full_name: &str) -> Option<&BranchScriptMap> {
        self.repos.get(full_name)
    }

    /// Script configured for `(full_name, branch)`, if any.
    pub fn script_for(&self, full_name: &str, branch: &str) -> Option<&str> {
        self.repo(full_name)
            .and_then(|branches| branches.get(branch))
            .map(String::as_str)
    }
}

impl From<RepoConfig> for ConfigStore {
    fn from(repos: RepoConfig) -> Self {
        Self { repos }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(json: &str) -> RepoConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_merge_incoming_wins_on_same_branch() {
        let mut base = layer(r#"{"acme/app": {"main": "a.sh", "dev": "dev-a.sh"}}"#);
        let incoming = layer(r#"{"acme/app": {"main": "b.sh", "staging": "stg-b.sh"}}"#);

        merge(&mut base, incoming);

        let app = &base["acme/app"];
        assert_eq!(app["main"], "b.sh");
        assert_eq!(app["dev"], "dev-a.sh");
        assert_eq!(app["staging"], "stg-b.sh");
        assert_eq!(app.len(), 3);
    }

    #[test]
    fn test_merge_adopts_new_repository() {
        let mut base = layer(r#"{"acme/app": {"main": "a.sh"}}"#);
        let incoming = layer(r#"{"acme/web": {"main": "web.sh"}}"#);

        merge(&mut base, incoming);

        assert_eq!(base.len(), 2);
        assert_eq!(base["acme/app"]["main"], "a.sh");
        assert_eq!(base["acme/web"]["main"], "web.sh");
    }

    #[test]
    fn test_merge_never_removes() {
        let mut base = layer(r#"{"acme/app": {"main": "a.sh"}}"#);
        merge(&mut base, layer(r#"{"acme/app": {}}"#));
        merge(&mut base, RepoConfig::new());

        assert_eq!(base["acme/app"]["main"], "a.sh");
    }

    #[test]
    fn test_parse_two_level() {
        let repos = parse_source(br#"{"acme/app": {"main": "./deploy.sh"}}"#).unwrap();
        assert_eq!(repos["acme/app"]["main"], "./deploy.sh");
    }

    #[test]
    fn test_parse_one_level_is_wildcard() {
        let one = parse_source(br#"{"main": "deploy.sh"}"#).unwrap();
        let two = parse_source(br#"{"*": {"main": "deploy.sh"}}"#).unwrap();
        assert_eq!(one, two);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_source(b"not json").is_err());
        assert!(parse_source(br#"{"main": 5}"#).is_err());
        assert!(parse_source(br#"["main"]"#).is_err());
    }

    #[test]
    fn test_store_lookup() {
        let store = ConfigStore::from(layer(r#"{"acme/app": {"main": "./deploy.sh"}}"#));

        assert_eq!(store.script_for("acme/app", "main"), Some("./deploy.sh"));
        assert_eq!(store.script_for("acme/app", "dev"), None);
        assert_eq!(store.script_for("acme/other", "main"), None);
    }

    #[test]
    fn test_store_wildcard_entry_is_exact_key_only() {
        let store = ConfigStore::from(parse_source(br#"{"main": "any.sh"}"#).unwrap());

        assert!(store.repo("acme/app").is_none());
        assert_eq!(store.script_for("acme/app", "main"), None);
        assert_eq!(store.script_for("someone/else", "main"), None);
        assert_eq!(store.script_for(WILDCARD_REPO, "main"), Some("any.sh"));
    }

    #[test]
    fn test_store_layering() {
        let mut store = ConfigStore::new();
        assert!(store.is_empty());

        store.merge(parse_source(br#"{"acme/app": {"main": "a.sh", "dev": "d.sh"}}"#).unwrap());
        store.merge(parse_source(br#"{"acme/app": {"main": "b.sh"}, "acme/web": {"main": "w.sh"}}"#).unwrap());

        assert_eq!(store.len(), 2);
        assert_eq!(store.script_for("acme/app", "main"), Some("b.sh"));
        assert_eq!(store.script_for("acme/app", "dev"), Some("d.sh"));
        assert_eq!(store.script_for("acme/web", "main"), Some("w.sh"));
    }
}
