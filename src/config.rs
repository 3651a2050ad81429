//! Mirror configuration: built-in defaults plus an optional config file.
//!
//! The file uses a small `key = value` subset of TOML: double-quoted strings,
//! non-negative integers, single-line string arrays and `#` comments. Every key overrides one default; unknown keys are rejected.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use url::Url;

use crate::discovery::{
    DEFAULT_SECTION_PREFIX, DEFAULT_SITEMAP_URLS, DEFAULT_SKIP_PATTERNS, DiscoveryOptions,
};
use crate::fetch::{
    DEFAULT_BASE_DELAY, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY,
    DEFAULT_READ_TIMEOUT_SECS, DEFAULT_RETRY_AFTER, RetryPolicy,
};
use crate::validate::{
    DEFAULT_INDICATOR_SCAN_LINES, DEFAULT_MIN_CHANGELOG_LENGTH, DEFAULT_MIN_MARKDOWN_INDICATORS,
    DEFAULT_MIN_PAGE_LENGTH, ValidationPolicy,
};

/// Raw changelog source.
pub const DEFAULT_CHANGELOG_URL: &str =
    "https://raw.githubusercontent.com/anthropics/claude-code/main/CHANGELOG.md";

/// Human-facing changelog page, recorded as provenance and in the header.
pub const DEFAULT_CHANGELOG_PAGE_URL: &str =
    "https://github.com/anthropics/claude-code/blob/main/CHANGELOG.md";

/// Minimum age of the manifest before a refresh runs (3 hours).
pub const DEFAULT_STALENESS_THRESHOLD_SECS: u64 = 3 * 60 * 60;

/// Pause between successful page fetches.
pub const DEFAULT_PAGE_DELAY_MS: u64 = 500;

const CONFIG_DIR_NAME: &str = "docmirror";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Every tunable of a mirror run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorConfig {
    /// Candidate sitemaps, tried in order.
    pub sitemap_urls: Vec<String>,
    /// Path fragment a sitemap URL must contain.
    pub section_prefix: String,
    /// Path fragments that exclude a page.
    pub skip_patterns: Vec<String>,
    /// Raw changelog URL.
    pub changelog_url: String,
    /// Changelog page URL.
    pub changelog_page_url: String,
    /// Freshness window in seconds.
    pub staleness_threshold_secs: u64,
    /// Inter-page pause in milliseconds.
    pub page_delay_ms: u64,
    /// Attempts per document, including the first.
    pub max_attempts: u32,
    /// Backoff base in milliseconds.
    pub retry_base_delay_ms: u64,
    /// Backoff cap in milliseconds.
    pub retry_max_delay_ms: u64,
    /// Wait on a 429 without a usable Retry-After.
    pub default_retry_after_secs: u64,
    pub min_page_length: usize,
    pub min_changelog_length: usize,
    pub min_markdown_indicators: usize,
    pub indicator_scan_lines: usize,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            sitemap_urls: to_owned_list(DEFAULT_SITEMAP_URLS),
            section_prefix: DEFAULT_SECTION_PREFIX.to_string(),
            skip_patterns: to_owned_list(DEFAULT_SKIP_PATTERNS),
            changelog_url: DEFAULT_CHANGELOG_URL.to_string(),
            changelog_page_url: DEFAULT_CHANGELOG_PAGE_URL.to_string(),
            staleness_threshold_secs: DEFAULT_STALENESS_THRESHOLD_SECS,
            page_delay_ms: DEFAULT_PAGE_DELAY_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_base_delay_ms: duration_ms(DEFAULT_BASE_DELAY),
            retry_max_delay_ms: duration_ms(DEFAULT_MAX_DELAY),
            default_retry_after_secs: DEFAULT_RETRY_AFTER.as_secs(),
            min_page_length: DEFAULT_MIN_PAGE_LENGTH,
            min_changelog_length: DEFAULT_MIN_CHANGELOG_LENGTH,
            min_markdown_indicators: DEFAULT_MIN_MARKDOWN_INDICATORS,
            indicator_scan_lines: DEFAULT_INDICATOR_SCAN_LINES,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
        }
    }
}

impl MirrorConfig {
    /// Checks cross-field and range constraints.
    ///
    /// # Errors
    ///
    /// Returns an error naming the offending key.
    pub fn validate(&self) -> Result<()> {
        if self.sitemap_urls.is_empty() {
            bail!("Invalid config value for `sitemap_urls`: at least one URL is required");
        }
        for url in &self.sitemap_urls {
            validate_url("sitemap_urls", url)?;
        }
        validate_url("changelog_url", &self.changelog_url)?;
        validate_url("changelog_page_url", &self.changelog_page_url)?;
        if self.section_prefix.is_empty() {
            bail!("Invalid config value for `section_prefix`: must not be empty");
        }
        if !(1..=10).contains(&self.max_attempts) {
            bail!(
                "Invalid config value for `max_attempts`: {}. Expected range: 1..=10",
                self.max_attempts
            );
        }
        if self.retry_base_delay_ms > self.retry_max_delay_ms {
            bail!(
                "Invalid config value for `retry_base_delay_ms`: {} exceeds `retry_max_delay_ms` ({})",
                self.retry_base_delay_ms,
                self.retry_max_delay_ms
            );
        }
        if self.page_delay_ms > 60_000 {
            bail!(
                "Invalid config value for `page_delay_ms`: {}. Expected range: 0..=60000",
                self.page_delay_ms
            );
        }
        if self.indicator_scan_lines == 0 {
            bail!("Invalid config value for `indicator_scan_lines`: 0. Expected at least 1");
        }
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        Ok(())
    }

    /// Retry policy for page and changelog fetches.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.retry_base_delay_ms),
            Duration::from_millis(self.retry_max_delay_ms),
        )
        .with_default_retry_after(Duration::from_secs(self.default_retry_after_secs))
    }

    /// Content validation thresholds.
    #[must_use]
    pub fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy {
            min_page_length: self.min_page_length,
            min_changelog_length: self.min_changelog_length,
            min_markdown_indicators: self.min_markdown_indicators,
            indicator_scan_lines: self.indicator_scan_lines,
        }
    }

    /// Sitemap candidates and page filters.
    #[must_use]
    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions {
            sitemap_urls: self.sitemap_urls.clone(),
            section_prefix: self.section_prefix.clone(),
            skip_patterns: self.skip_patterns.clone(),
        }
    }

    #[must_use]
    pub fn staleness_threshold(&self) -> Duration {
        Duration::from_secs(self.staleness_threshold_secs)
    }

    #[must_use]
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_string()).collect()
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn validate_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .with_context(|| format!("Invalid config value for `{field}`: '{value}' is not a URL"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("Invalid config value for `{field}`: '{value}' must use http or https");
    }
    Ok(())
}

fn validate_timeout_secs(field: &str, value: u64) -> Result<()> {
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/docmirror/config.toml`
/// 2. `$HOME/.config/docmirror/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join(CONFIG_DIR_NAME)
                .join(CONFIG_FILE_NAME),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loaded config plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Path that was consulted, if any.
    pub path: Option<PathBuf>,
    /// Effective configuration.
    pub config: MirrorConfig,
    /// Whether a file was actually read.
    pub loaded_from_file: bool,
}

/// Loads configuration.
///
/// An explicit path must exist. The default path is optional: when it is
/// absent the built-in defaults apply.
///
/// # Errors
///
/// Returns an error when the file cannot be read, has a syntax error, names
/// an unknown key, or holds an out-of-range value.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = load_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config,
            loaded_from_file: true,
        });
    }

    let path = resolve_default_config_path();
    match path.as_deref() {
        Some(path_ref) if path_ref.exists() => {
            let config = load_file_config(path_ref)?;
            Ok(LoadedConfig {
                path,
                config,
                loaded_from_file: true,
            })
        }
        _ => Ok(LoadedConfig {
            path,
            config: MirrorConfig::default(),
            loaded_from_file: false,
        }),
    }
}

fn load_file_config(path: &Path) -> Result<MirrorConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

/// Parses config file contents over the built-in defaults.
///
/// # Errors
///
/// Returns an error naming the key and line of the first bad entry.
pub fn parse_config_str(raw: &str) -> Result<MirrorConfig> {
    let mut cfg = MirrorConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let invalid = || format!("Invalid `{key}` value on line {line_no}");

        match key {
            "sitemap_urls" => cfg.sitemap_urls = parse_string_array(value).with_context(invalid)?,
            "section_prefix" => {
                cfg.section_prefix = parse_string_literal(value).with_context(invalid)?;
            }
            "skip_patterns" => {
                cfg.skip_patterns = parse_string_array(value).with_context(invalid)?;
            }
            "changelog_url" => {
                cfg.changelog_url = parse_string_literal(value).with_context(invalid)?;
            }
            "changelog_page_url" => {
                cfg.changelog_page_url = parse_string_literal(value).with_context(invalid)?;
            }
            "staleness_threshold_secs" => {
                cfg.staleness_threshold_secs = parse_integer_u64(value).with_context(invalid)?;
            }
            "page_delay_ms" => cfg.page_delay_ms = parse_integer_u64(value).with_context(invalid)?,
            "max_attempts" => {
                let parsed = parse_integer_u64(value).with_context(invalid)?;
                cfg.max_attempts = u32::try_from(parsed)
                    .map_err(|_| anyhow::anyhow!("max_attempts out of range for u32"))?;
            }
            "retry_base_delay_ms" => {
                cfg.retry_base_delay_ms = parse_integer_u64(value).with_context(invalid)?;
            }
            "retry_max_delay_ms" => {
                cfg.retry_max_delay_ms = parse_integer_u64(value).with_context(invalid)?;
            }
            "default_retry_after_secs" => {
                cfg.default_retry_after_secs = parse_integer_u64(value).with_context(invalid)?;
            }
            "min_page_length" => cfg.min_page_length = parse_usize(value).with_context(invalid)?,
            "min_changelog_length" => {
                cfg.min_changelog_length = parse_usize(value).with_context(invalid)?;
            }
            "min_markdown_indicators" => {
                cfg.min_markdown_indicators = parse_usize(value).with_context(invalid)?;
            }
            "indicator_scan_lines" => {
                cfg.indicator_scan_lines = parse_usize(value).with_context(invalid)?;
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = parse_integer_u64(value).with_context(invalid)?;
            }
            "read_timeout_secs" => {
                cfg.read_timeout_secs = parse_integer_u64(value).with_context(invalid)?;
            }
            unknown => bail!("Unknown configuration key: '{unknown}' on line {line_no}"),
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    let inner = &raw_value[1..raw_value.len() - 1];
    if inner.contains('"') {
        bail!("Unexpected quote inside string");
    }
    Ok(inner.to_string())
}

fn parse_string_array(raw_value: &str) -> Result<Vec<String>> {
    let Some(inner) = raw_value
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    else {
        bail!("Expected [\"...\", ...] array");
    };

    let mut items = Vec::new();
    let mut in_string = false;
    let mut start = 0;
    for (index, ch) in inner.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            ',' if !in_string => {
                items.push(parse_string_literal(inner[start..index].trim())?);
                start = index + 1;
            }
            _ => {}
        }
    }
    if in_string {
        bail!("Unterminated string in array");
    }
    let last = inner[start..].trim();
    if !last.is_empty() {
        items.push(parse_string_literal(last)?);
    }
    Ok(items)
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_usize(raw_value: &str) -> Result<usize> {
    let value = parse_integer_u64(raw_value)?;
    usize::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for usize"))
}
