// OAuth scopes offered per platform, and the headless selection model used
// by permission pickers.

use serde::Serialize;

/// A grantable scope.
///
/// `required` scopes can never be deselected. `default` scopes start selected
/// but can be removed unless also required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Permission {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub required: bool,
    pub default: bool,
}

const fn perm(
    id: &'static str,
    label: &'static str,
    description: &'static str,
    required: bool,
    default: bool,
) -> Permission {
    Permission {
        id,
        label,
        description,
        required,
        default,
    }
}

pub static REDDIT_PERMISSIONS: &[Permission] = &[
    perm("identity", "Access identity", "Access my Reddit username and signup date (Required)", true, true),
    perm("read", "Read content", "Access posts and comments through my account (Required)", true, true),
    perm("history", "History", "Access my voting history and hidden posts (Required)", true, true),
    perm("mysubreddits", "My Subreddits", "Access the list of subreddits I moderate, contribute to, and subscribe to", false, true),
    perm("submit", "Submit content", "Submit links and comments from my account", false, true),
    perm("edit", "Edit content", "Edit and delete my comments and submissions", false, false),
    perm("vote", "Vote", "Submit and change my votes on comments and submissions", false, false),
    perm("flair", "Manage flair", "Access and manage post flairs", false, true),
];

pub static X_PERMISSIONS: &[Permission] = &[
    perm("tweet.read", "Read Tweets", "Read Tweets and replies (Required)", true, true),
    perm("users.read", "Read Profile", "Read profile information (Required)", true, true),
    perm("tweet.write", "Write Tweets", "Post and delete Tweets", false, true),
    perm("offline.access", "Stay Connected", "Maintain access without re-login", false, true),
];

pub static DEVTO_PERMISSIONS: &[Permission] = &[];

pub static GOOGLE_PERMISSIONS: &[Permission] = &[
    perm("https://www.googleapis.com/auth/userinfo.profile", "Profile Information", "Access your name and profile picture (Required)", true, true),
    perm("https://www.googleapis.com/auth/userinfo.email", "Email Address", "Access your email address (Required)", true, true),
    perm("https://www.googleapis.com/auth/youtube.readonly", "YouTube (Read)", "Read YouTube channel and video data", false, false),
    perm("https://www.googleapis.com/auth/youtube", "YouTube (Full Access)", "Upload videos and manage YouTube channel", false, false),
    perm("https://www.googleapis.com/auth/blogger", "Blogger", "Publish and manage blog posts", false, false),
    perm("https://www.googleapis.com/auth/drive.readonly", "Google Drive (Read)", "Read files in Google Drive", false, false),
    perm("https://www.googleapis.com/auth/gmail.compose", "Gmail (Send)", "Send emails via Gmail", false, false),
    perm("https://www.googleapis.com/auth/photoslibrary.readonly", "Google Photos (Read)", "View photos and albums", false, false),
];

/// Local selection state for a permission picker, held until the user
/// submits a connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionSelection {
    permissions: Vec<Permission>,
    selected: Vec<&'static str>,
}

impl PermissionSelection {
    /// Build a selection over `permissions`.
    ///
    /// A non-empty `allowlist` narrows the offered set to allowlisted ids plus
    /// every required permission.
    pub fn new(permissions: &[Permission], allowlist: Option<&[&str]>) -> Self {
        let permissions: Vec<Permission> = match allowlist {
            Some(ids) if !ids.is_empty() => permissions
                .iter()
                .filter(|p| p.required || ids.contains(&p.id))
                .copied()
                .collect(),
            _ => permissions.to_vec(),
        };
        let mut selection = Self {
            permissions,
            selected: Vec::new(),
        };
        selection.reset();
        selection
    }

    /// Restore the pre-selected set (`default || required`).
    pub fn reset(&mut self) {
        self.selected = self
            .permissions
            .iter()
            .filter(|p| p.default || p.required)
            .map(|p| p.id)
            .collect();
    }

    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    pub fn is_required(&self, id: &str) -> bool {
        self.permissions.iter().any(|p| p.id == id && p.required)
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| *s == id)
    }

    /// Flip one permission. Required and unknown ids are ignored.
    ///
    /// Returns whether the selection changed.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.is_required(id) {
            return false;
        }
        if let Some(pos) = self.selected.iter().position(|s| *s == id) {
            self.selected.remove(pos);
            return true;
        }
        match self.permissions.iter().find(|p| p.id == id) {
            Some(permission) => {
                self.selected.push(permission.id);
                true
            }
            None => false,
        }
    }

    /// Selected scope ids, in table order.
    pub fn selected(&self) -> Vec<String> {
        self.permissions
            .iter()
            .filter(|p| self.is_selected(p.id))
            .map(|p| p.id.to_string())
            .collect()
    }

    pub fn required_ids(&self) -> Vec<&'static str> {
        self.permissions.iter().filter(|p| p.required).map(|p| p.id).collect()
    }
}
