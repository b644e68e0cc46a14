use std::fmt;

/// One way of obtaining an authenticated session, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStrategy {
    /// Reuse the session blob saved by a previous run.
    PersistedSession,
    /// Adopt a browser session cookie supplied by the operator.
    SessionCookie,
    /// Full username/password login. Most likely to trigger platform checks.
    Credentials,
}

impl fmt::Display for LoginStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginStrategy::PersistedSession => write!(f, "persisted session"),
            LoginStrategy::SessionCookie => write!(f, "session cookie"),
            LoginStrategy::Credentials => write!(f, "credentials"),
        }
    }
}

/// Operator-supplied login material. Blank values count as absent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    username: Option<String>,
    password: Option<String>,
    session_cookie: Option<String>,
}

impl Credentials {
    pub fn new(username: &str, password: &str, session_cookie: &str) -> Self {
        Self {
            username: non_blank(username),
            password: non_blank(password),
            session_cookie: non_blank(session_cookie),
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn session_cookie(&self) -> Option<&str> {
        self.session_cookie.as_deref()
    }

    /// Both username and password are present.
    pub fn has_password_login(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    /// A session cookie, or a username/password pair, is present.
    pub fn is_usable(&self) -> bool {
        self.session_cookie.is_some() || self.has_password_login()
    }

    /// Strategies to try, in order. Restoring a persisted session is always
    /// attempted first since it needs no configured secret.
    pub fn login_strategies(&self) -> Vec<LoginStrategy> {
        let mut strategies = vec![LoginStrategy::PersistedSession];
        if self.session_cookie.is_some() {
            strategies.push(LoginStrategy::SessionCookie);
        }
        if self.has_password_login() {
            strategies.push(LoginStrategy::Credentials);
        }
        strategies
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "session_cookie",
                &self.session_cookie.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
