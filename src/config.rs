//! Explorer configuration: which document, which AvaTax environment, which
//! credentials.

use std::path::PathBuf;
use std::time::Duration;

use crate::format::DEFAULT_INDENT;
use crate::generator::CyclePolicy;

pub const SANDBOX_BASE_URL: &str = "https://sandbox-rest.avatax.com";
pub const PRODUCTION_BASE_URL: &str = "https://rest.avatax.com";
pub const DEFAULT_SWAGGER_PATH: &str = "swagger.json";

/// AvaTax environment a request is sent to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Sandbox,
    Production,
}

impl Environment {
    /// Case-insensitive: "sandbox" / "production".
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sandbox" => Some(Self::Sandbox),
            "production" => Some(Self::Production),
            _ => None,
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Sandbox => SANDBOX_BASE_URL,
            Self::Production => PRODUCTION_BASE_URL,
        }
    }
}

/// Account number + license key, sent as HTTP Basic auth.
#[derive(Clone)]
pub struct Credentials {
    pub account_number: String,
    pub license_key: String,
}

impl Credentials {
    pub fn new(account_number: impl Into<String>, license_key: impl Into<String>) -> Self {
        Self {
            account_number: account_number.into(),
            license_key: license_key.into(),
        }
    }
}

// License keys stay out of logs and debug output
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("account_number", &self.account_number)
            .field("license_key", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ExplorerConfig {
    /// Swagger JSON document to load
    pub swagger_path: PathBuf,
    pub environment: Environment,
    /// Overrides the environment's base URL when set
    pub base_url: Option<String>,
    pub credentials: Option<Credentials>,
    /// Request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
    /// Indent width of printed JSON
    pub indent: usize,
    pub cycle_policy: CyclePolicy,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SWAGGER_PATH)
    }
}

impl ExplorerConfig {
    pub fn new(swagger_path: impl Into<PathBuf>) -> Self {
        Self {
            swagger_path: swagger_path.into(),
            environment: Environment::default(),
            base_url: None,
            credentials: None,
            timeout: None,
            indent: DEFAULT_INDENT,
            cycle_policy: CyclePolicy::default(),
        }
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// A zero timeout means no timeout.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        self
    }

    pub fn indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub fn cycle_policy(mut self, policy: CyclePolicy) -> Self {
        self.cycle_policy = policy;
        self
    }

    /// Base URL requests go to.
    pub fn resolved_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
    }
}
