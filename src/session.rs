use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthState {
    #[default]
    Anonymous,
    Authenticated,
}

/// Pages the office UI can navigate to once signed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum View {
    Dashboard,
    AddStudent,
    StudentDashboard,
    EditStudent,
}

pub const ALL_VIEWS: [View; 4] = [
    View::Dashboard,
    View::AddStudent,
    View::StudentDashboard,
    View::EditStudent,
];

/// The single shared admin login.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    fn accepts(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

#[derive(Debug, Clone)]
pub enum SessionAction {
    Login { username: String, password: String },
    Logout,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub auth: AuthState,
    pub username: Option<String>,
    pub login_failed: bool,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.auth == AuthState::Authenticated
    }

    pub fn views(&self) -> &'static [View] {
        if self.is_authenticated() {
            &ALL_VIEWS
        } else {
            &[]
        }
    }

    /// Pure transition; the caller stores the result.
    pub fn reduce(&self, action: &SessionAction, credentials: &Credentials) -> Session {
        match action {
            SessionAction::Login { username, password } => {
                if credentials.accepts(username, password) {
                    Session {
                        auth: AuthState::Authenticated,
                        username: Some(username.clone()),
                        login_failed: false,
                    }
                } else {
                    // A failed attempt signs out whoever was signed in.
                    Session {
                        auth: AuthState::Anonymous,
                        username: None,
                        login_failed: true,
                    }
                }
            }
            SessionAction::Logout => Session::default(),
        }
    }
}
