//! Run settings: command line over config file over built-in defaults.

use crate::RunArgs;
use anyhow::{bail, Context, Result};
use courtres_core::{Credentials, PartialBlockPolicy, RunProfile};
use courtres_execution::{ClaimInstant, SiteMap, Timings};
use courtres_webdriver::WebDriverConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Contents of a `--config` JSON file. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Rehearsal mode
    pub test_mode: Option<bool>,
    /// Account email
    pub email: Option<String>,
    /// Account password
    pub password: Option<String>,
    /// Courts in preference order
    pub courts: Vec<String>,
    /// Slot labels in order
    pub slots: Vec<String>,
    /// Claim instant, `HH:MM[:SS]`
    pub at: Option<ClaimInstant>,
    /// Partial block policy
    pub partial_block: Option<PartialBlockPolicy>,
    /// WebDriver connection
    pub webdriver: Option<WebDriverConfig>,
    /// Site map overrides
    pub site: Option<SiteMap>,
    /// Timing overrides
    pub timings: Option<Timings>,
    /// Failure screenshot directory
    pub screenshot_dir: Option<PathBuf>,
}

impl FileConfig {
    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))
    }
}

/// Everything a run needs, fully resolved.
#[derive(Debug)]
pub struct Settings {
    /// Run profile
    pub profile: RunProfile,
    /// Account, if one was given anywhere
    pub credentials: Option<Credentials>,
    /// Claim instant
    pub claim_at: ClaimInstant,
    /// Site map
    pub site: SiteMap,
    /// Timings
    pub timings: Timings,
    /// WebDriver connection
    pub webdriver: WebDriverConfig,
    /// Failure screenshot directory
    pub screenshot_dir: Option<PathBuf>,
}

impl Settings {
    /// Resolve settings from the command line, loading `--config` if given.
    pub fn from_args(args: &RunArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Ok(Self::resolve(args, file))
    }

    /// Merge command line values over file values over defaults.
    pub fn resolve(args: &RunArgs, file: FileConfig) -> Self {
        let test_mode = if args.live {
            false
        } else {
            args.test_mode || file.test_mode.unwrap_or(false)
        };
        let courts = pick(args.courts.clone(), file.courts);
        let slots = pick(args.slots.clone(), file.slots);
        let partial_block = if args.require_all {
            PartialBlockPolicy::RequireAll
        } else {
            file.partial_block.unwrap_or_default()
        };
        let profile = RunProfile::for_mode(test_mode)
            .with_courts(courts)
            .with_slots(slots)
            .with_partial_block(partial_block);

        let email = args.email.clone().or(file.email);
        let password = args.password.clone().or(file.password);
        let credentials = match (email, password) {
            (Some(email), Some(password)) => Some(Credentials::new(email, password)),
            _ => None,
        };

        let mut webdriver = file.webdriver.unwrap_or_default();
        if let Some(url) = &args.webdriver_url {
            webdriver.url = url.clone();
        }
        if args.headed {
            webdriver.headless = false;
        }

        Self {
            profile,
            credentials,
            claim_at: args.at.or(file.at).unwrap_or_default(),
            site: file.site.unwrap_or_default(),
            timings: file.timings.unwrap_or_default(),
            webdriver,
            screenshot_dir: args.screenshot_dir.clone().or(file.screenshot_dir),
        }
    }

    /// Credentials, or an error naming what is missing.
    pub fn require_credentials(&self) -> Result<Credentials> {
        match &self.credentials {
            Some(credentials) => Ok(credentials.clone()),
            None => bail!("missing credentials: set RESERVE_EMAIL and RESERVE_PASSWORD or pass --email/--password"),
        }
    }
}

fn pick(cli: Vec<String>, file: Vec<String>) -> Vec<String> {
    if cli.is_empty() {
        file
    } else {
        cli
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> RunArgs {
        RunArgs {
            test_mode: false,
            live: false,
            email: None,
            password: None,
            courts: Vec::new(),
            slots: Vec::new(),
            at: None,
            require_all: false,
            webdriver_url: None,
            headed: false,
            config: None,
            screenshot_dir: None,
        }
    }

    #[test]
    fn test_defaults_without_file() {
        let settings = Settings::resolve(&args(), FileConfig::default());
        assert!(!settings.profile.test_mode());
        assert_eq!(settings.profile.court_candidates(), ["PB Court 25"]);
        assert_eq!(settings.claim_at, ClaimInstant::default());
        assert!(settings.webdriver.headless);
        assert!(settings.require_credentials().is_err());
    }

    #[test]
    fn test_cli_wins_over_file() {
        let file: FileConfig = serde_json::from_str(
            r#"{
                "test_mode": true,
                "email": "file@example.com",
                "password": "from-file",
                "courts": ["PB Court 3"],
                "slots": ["-2:30pm"],
                "at": "13:59:30",
                "webdriver": { "url": "http://grid:4444" }
            }"#,
        )
        .unwrap();
        let mut args = args();
        args.courts = vec!["PB Court 7".into()];
        args.email = Some("cli@example.com".into());
        args.headed = true;

        let settings = Settings::resolve(&args, file);

        assert!(settings.profile.test_mode());
        assert_eq!(settings.profile.court_candidates(), ["PB Court 7"]);
        assert_eq!(settings.profile.time_slot_candidates(), ["-2:30pm"]);
        assert_eq!(settings.claim_at, ClaimInstant::new(13, 59, 30).unwrap());
        assert_eq!(settings.webdriver.url, "http://grid:4444");
        assert!(!settings.webdriver.headless);
        let credentials = settings.require_credentials().unwrap();
        assert_eq!(credentials.email, "cli@example.com");
        assert_eq!(credentials.password, "from-file");
    }

    #[test]
    fn test_live_flag_overrides_rehearsal_file() {
        let file: FileConfig = serde_json::from_str(r#"{ "test_mode": true }"#).unwrap();
        let mut args = args();
        args.live = true;

        let settings = Settings::resolve(&args, file);

        assert!(!settings.profile.test_mode());
        assert_eq!(settings.profile.court_candidates(), ["PB Court 25"]);
    }

    #[test]
    fn test_unknown_file_field_rejected() {
        assert!(serde_json::from_str::<FileConfig>(r#"{ "court": "PB Court 1" }"#).is_err());
    }
}
