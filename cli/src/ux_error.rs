use colored::Colorize;
use user_export::ExportError;

#[derive(Debug)]
pub struct UxError {
    pub what: String,
    pub why: Option<String>,
    pub how_to_fix: Vec<String>,
    pub suggested_command: Option<String>
}

impl UxError {
    pub fn new(what: impl Into<String>) -> Self {
        Self {
            what: what.into(),
            why: None,
            how_to_fix: Vec::new(),
            suggested_command: None
        }
    }

    pub fn why(mut self, reason: impl Into<String>) -> Self {
        self.why = Some(reason.into());
        self
    }

    pub fn fix(mut self, suggestion: impl Into<String>) -> Self {
        self.how_to_fix.push(suggestion.into());
        self
    }

    pub fn suggest(mut self, cmd: impl Into<String>) -> Self {
        self.suggested_command = Some(cmd.into());
        self
    }

    pub fn display(&self) {
        eprintln!();
        eprintln!("{} {}", "error:".red().bold(), self.what.white().bold());

        if let Some(why) = &self.why {
            eprintln!("       {}", why.dimmed());
        }

        if !self.how_to_fix.is_empty() {
            eprintln!();
            eprintln!("{}", "How to fix:".yellow().bold());
            for (i, fix) in self.how_to_fix.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, fix);
            }
        }

        if let Some(cmd) = &self.suggested_command {
            eprintln!();
            eprintln!("{}", "Try this:".green().bold());
            eprintln!("  $ {}", cmd.cyan());
        }
        eprintln!();
    }
}

impl std::fmt::Display for UxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.what)
    }
}

impl std::error::Error for UxError {}

pub fn missing_credentials() -> UxError {
    UxError::new("Missing Genesys Cloud client credentials")
        .why("An OAuth client id and secret are required for the client-credentials grant")
        .fix("Set GENESYS_CLIENT_ID and GENESYS_CLIENT_SECRET")
        .fix("Or add client_id and client_secret under [platform] in a config file")
        .suggest("genesys-export config")
}

pub fn config_invalid(message: &str) -> UxError {
    UxError::new(format!("Configuration error: {}", message))
        .why("One or more settings are missing or out of range")
        .fix("Check the values from --config, GENESYS_* variables and flags")
        .suggest("genesys-export config")
}

pub fn config_file(path: &str, message: &str) -> UxError {
    UxError::new(format!("Cannot load config file '{}'", path))
        .why(message.to_string())
        .fix("Use a .toml, .yaml or .yml file")
        .fix("Check the file for syntax errors")
}

pub fn auth_failed(message: &str) -> UxError {
    UxError::new("Authentication with Genesys Cloud failed")
        .why(message.to_string())
        .fix("Verify the client id and secret")
        .fix("Check that the OAuth client uses the Client Credentials grant")
        .fix("Make sure --region matches the organization's region")
        .suggest("genesys-export config")
}

pub fn rate_limited(endpoint: &str, retry_after: u64) -> UxError {
    UxError::new(format!("Rate limit exceeded on '{}'", endpoint))
        .why(format!(
            "The API kept answering 429. Last advised wait was {} seconds",
            retry_after
        ))
        .fix("Wait a few minutes before retrying")
        .fix("Use a larger --page-size to reduce the number of requests")
}

pub fn fetch_failed(endpoint: &str, page: u32, status: u16, message: &str) -> UxError {
    let error = UxError::new(format!(
        "Request to '{}' failed on page {} with status {}",
        endpoint, page, status
    ))
    .why(message.to_string());

    match status {
        401 | 403 => error
            .fix("Grant the OAuth client's role permission to read users, divisions, skills and queues")
            .fix("Check the client belongs to the organization you are exporting"),
        500..=599 => error
            .fix("The service may be degraded; retry later")
            .fix("Check the Genesys Cloud status page"),
        _ => error.fix("Check --api-base-url or --region")
    }
}

pub fn network_error(message: &str) -> UxError {
    UxError::new("Cannot reach Genesys Cloud")
        .why(message.to_string())
        .fix("Check your network connection and proxy settings")
        .fix("Verify the region or --api-base-url")
        .suggest("genesys-export config")
}

pub fn unexpected_response(message: &str) -> UxError {
    UxError::new("Unexpected response from Genesys Cloud")
        .why(message.to_string())
        .fix("Check that --api-base-url points at the /api/v2 root")
}

pub fn write_failed(message: &str) -> UxError {
    UxError::new("Failed to write the export file")
        .why(message.to_string())
        .fix("Check the output directory exists and is writable")
        .fix("Close the file if it is open in a spreadsheet application")
}

pub fn from_export_error(error: &ExportError) -> UxError {
    match error {
        ExportError::AuthError(message) => auth_failed(message),
        ExportError::RateLimitExceeded {
            endpoint,
            retry_after_seconds,
            ..
        } => rate_limited(endpoint, *retry_after_seconds),
        ExportError::FetchError {
            endpoint,
            page,
            status,
            message
        } => fetch_failed(endpoint, *page, *status, message),
        ExportError::HttpError(e) => network_error(&e.to_string()),
        ExportError::SerializationError(e) => unexpected_response(&e.to_string()),
        ExportError::ConfigError(message) => config_invalid(message),
        ExportError::WriteError(message) => write_failed(message)
    }
}
