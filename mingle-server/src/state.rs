use crate::db::Database;
use crate::identity::IdentityClient;
use crate::media::MediaStore;
use crate::session::SessionManager;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: SessionManager,
    pub identity: IdentityClient,
    pub media: MediaStore,
}

impl AppState {
    pub fn new(db: Database, identity: IdentityClient, media: MediaStore) -> Self {
        let sessions = SessionManager::new(db.clone());
        Self {
            db,
            sessions,
            identity,
            media,
        }
    }

    /// Get the authenticated user id from a session token
    pub fn authenticated_user_id(&self, token: &str) -> Option<String> {
        self.sessions.validate_session(token).ok()
    }
}
