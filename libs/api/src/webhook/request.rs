use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct PushPayload {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub pusher: Pusher,
    /// `null` when the push deleted the ref.
    pub head_commit: Option<HeadCommit>,
}

#[derive(Deserialize, Debug)]
pub struct Pusher {
    pub name: String,
}

#[derive(Deserialize, Debug)]
pub struct HeadCommit {
    pub id: String,
    pub timestamp: String,
}

#[derive(Deserialize, Debug)]
pub struct PullRequestPayload {
    pub action: String,
    pub pull_request: PullRequest,
}

#[derive(Deserialize, Debug)]
pub struct PullRequest {
    pub id: u64,
    pub user: User,
    pub head: BranchRef,
    pub base: BranchRef,
    pub created_at: String,
    pub merged_at: Option<String>,
    #[serde(default)]
    pub merged: bool,
}

#[derive(Deserialize, Debug)]
pub struct User {
    pub login: String,
}

#[derive(Deserialize, Debug)]
pub struct BranchRef {
    #[serde(rename = "ref")]
    pub name: String,
}
