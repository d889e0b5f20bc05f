//! Optional project features and the prompt directives derived from them.

use serde::{Deserialize, Serialize};

/// A named, optional part of a generated project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Git,
    Tests,
    GithubActions,
    Docs,
}

impl Feature {
    pub const ALL: [Feature; 4] = [
        Feature::Git,
        Feature::Tests,
        Feature::GithubActions,
        Feature::Docs,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Feature::Git => "Git Initialization",
            Feature::Tests => "Testing Framework",
            Feature::GithubActions => "GitHub Actions",
            Feature::Docs => "Documentation",
        }
    }

    fn include_directive(&self) -> &'static str {
        match self {
            Feature::Git => "Git initialization with appropriate .gitignore",
            Feature::Tests => "Testing framework with sample tests",
            Feature::GithubActions => "GitHub Actions CI/CD workflows",
            Feature::Docs => "Documentation structure and templates",
        }
    }

    fn exclude_directive(&self) -> &'static str {
        match self {
            Feature::Git => "Do NOT initialize Git or create any .gitignore files",
            Feature::Tests => "Do NOT include any testing frameworks or test files",
            Feature::GithubActions => "Do NOT include any GitHub Actions or CI/CD workflow files",
            Feature::Docs => {
                "Do NOT create documentation directories or files beyond a basic README.md"
            }
        }
    }
}

/// On/off state for every [`Feature`]; serialized into the generation summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureSelection {
    pub git: bool,
    pub tests: bool,
    pub github_actions: bool,
    pub docs: bool,
}

impl Default for FeatureSelection {
    fn default() -> Self {
        Self {
            git: true,
            tests: true,
            github_actions: false,
            docs: false,
        }
    }
}

/// Positive and negative instructions for the generation prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeatureDirectives {
    pub include: Vec<&'static str>,
    pub exclude: Vec<&'static str>,
}

impl FeatureSelection {
    pub fn is_enabled(&self, feature: Feature) -> bool {
        match feature {
            Feature::Git => self.git,
            Feature::Tests => self.tests,
            Feature::GithubActions => self.github_actions,
            Feature::Docs => self.docs,
        }
    }

    pub fn set(&mut self, feature: Feature, enabled: bool) {
        let slot = match feature {
            Feature::Git => &mut self.git,
            Feature::Tests => &mut self.tests,
            Feature::GithubActions => &mut self.github_actions,
            Feature::Docs => &mut self.docs,
        };
        *slot = enabled;
    }

    pub fn directives(&self) -> FeatureDirectives {
        let mut directives = FeatureDirectives::default();
        for feature in Feature::ALL {
            if self.is_enabled(feature) {
                directives.include.push(feature.include_directive());
            } else {
                directives.exclude.push(feature.exclude_directive());
            }
        }
        directives
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_git_and_tests_only() {
        let selection = FeatureSelection::default();
        assert!(selection.is_enabled(Feature::Git));
        assert!(selection.is_enabled(Feature::Tests));
        assert!(!selection.is_enabled(Feature::GithubActions));
        assert!(!selection.is_enabled(Feature::Docs));
    }

    #[test]
    fn directives_split_by_selection() {
        let mut selection = FeatureSelection::default();
        selection.set(Feature::Git, false);
        let directives = selection.directives();
        assert_eq!(directives.include, vec!["Testing framework with sample tests"]);
        assert_eq!(directives.exclude.len(), 3);
        assert!(directives.exclude[0].starts_with("Do NOT initialize Git"));
    }

    #[test]
    fn selection_serializes_with_feature_keys() {
        let value = serde_json::to_value(FeatureSelection::default()).expect("json");
        for key in ["git", "tests", "github_actions", "docs"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }
}
