//! Versioned fallback page list.
//!
//! Used whenever sitemap enumeration yields nothing usable. Entries are
//! curated by hand when upstream topics are added or removed; nothing prunes
//! them automatically.

/// Document identifiers mirrored when discovery comes back empty.
pub const FALLBACK_PAGES: &[&str] = &[
    "/en/docs/claude-code/overview",
    "/en/docs/claude-code/quickstart",
    "/en/docs/claude-code/setup",
    "/en/docs/claude-code/cli-reference",
    "/en/docs/claude-code/common-workflows",
    "/en/docs/claude-code/interactive-mode",
    "/en/docs/claude-code/settings",
    "/en/docs/claude-code/model-config",
    "/en/docs/claude-code/network-config",
    "/en/docs/claude-code/terminal-config",
    "/en/docs/claude-code/output-styles",
    "/en/docs/claude-code/statusline",
    "/en/docs/claude-code/hooks",
    "/en/docs/claude-code/hooks-guide",
    "/en/docs/claude-code/mcp",
    "/en/docs/claude-code/skills",
    "/en/docs/claude-code/slash-commands",
    "/en/docs/claude-code/plugins",
    "/en/docs/claude-code/plugins-reference",
    "/en/docs/claude-code/plugin-marketplaces",
    "/en/docs/claude-code/sub-agents",
    "/en/docs/claude-code/memory",
    "/en/docs/claude-code/checkpointing",
    "/en/docs/claude-code/analytics",
    "/en/docs/claude-code/monitoring-usage",
    "/en/docs/claude-code/costs",
    "/en/docs/claude-code/github-actions",
    "/en/docs/claude-code/gitlab-ci-cd",
    "/en/docs/claude-code/vs-code",
    "/en/docs/claude-code/jetbrains",
    "/en/docs/claude-code/devcontainer",
    "/en/docs/claude-code/claude-code-on-the-web",
    "/en/docs/claude-code/third-party-integrations",
    "/en/docs/claude-code/amazon-bedrock",
    "/en/docs/claude-code/google-vertex-ai",
    "/en/docs/claude-code/llm-gateway",
    "/en/docs/claude-code/iam",
    "/en/docs/claude-code/security",
    "/en/docs/claude-code/sandboxing",
    "/en/docs/claude-code/data-usage",
    "/en/docs/claude-code/legal-and-compliance",
    "/en/docs/claude-code/headless",
    "/en/docs/claude-code/troubleshooting",
    "/en/docs/claude-code/sdk/migration-guide",
];

/// Returns the fallback list as owned identifiers.
#[must_use]
pub fn fallback_pages() -> Vec<String> {
    FALLBACK_PAGES.iter().map(|page| (*page).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_list_is_nonempty_and_unique() {
        let mut seen = std::collections::HashSet::new();
        assert!(!FALLBACK_PAGES.is_empty());
        for page in FALLBACK_PAGES {
            assert!(seen.insert(page), "duplicate fallback entry {page}");
        }
    }

    #[test]
    fn test_fallback_entries_share_section_prefix() {
        assert!(
            FALLBACK_PAGES
                .iter()
                .all(|page| page.starts_with("/en/docs/claude-code/"))
        );
    }

    #[test]
    fn test_fallback_pages_preserves_order() {
        let owned = fallback_pages();
        assert_eq!(owned.len(), FALLBACK_PAGES.len());
        assert_eq!(owned[0], "/en/docs/claude-code/overview");
        assert_eq!(
            owned.last().map(String::as_str),
            Some("/en/docs/claude-code/sdk/migration-guide")
        );
    }
}
