//! Profile selection
//!
//! Profiles are given as one line, separated by `;` (or `,`), for example
//! `dev; prod`.

use tracing::debug;

/// Prompt shown when `--profiles` is not given
pub const PROFILES_PROMPT: &str = "Profiles to consolidate (semicolon separated, e.g. dev; prod)";

/// Errors for interactive input
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("failed to read input: {0}")]
    Input(#[from] dialoguer::Error),

    #[error("no profiles given")]
    Empty,
}

/// Split a profile list into names.
///
/// Whitespace is stripped, empty entries and duplicates are dropped (first
/// occurrence keeps its position), and the default profile is removed since
/// it always takes part.
pub fn parse_profile_list(input: &str, default_profile: &str) -> Vec<String> {
    let mut profiles: Vec<String> = Vec::new();
    for name in input.split(|c| c == ';' || c == ',') {
        let name: String = name.chars().filter(|c| !c.is_whitespace()).collect();
        if name.is_empty() || name == default_profile || profiles.contains(&name) {
            continue;
        }
        profiles.push(name);
    }
    profiles
}

/// Ask for the profile list on the terminal.
pub fn prompt_profiles(default_profile: &str) -> Result<Vec<String>, PromptError> {
    let default_name = default_profile.to_string();
    let line: String = dialoguer::Input::new()
        .with_prompt(PROFILES_PROMPT)
        .validate_with(move |input: &String| -> Result<(), String> {
            if parse_profile_list(input, &default_name).is_empty() {
                Err("enter at least one profile other than the default".to_string())
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let profiles = parse_profile_list(&line, default_profile);
    if profiles.is_empty() {
        return Err(PromptError::Empty);
    }
    debug!(?profiles, "profiles selected");
    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semicolon_list() {
        assert_eq!(parse_profile_list("dev; prod", "default"), vec!["dev", "prod"]);
    }

    #[test]
    fn test_strips_whitespace_and_empties() {
        assert_eq!(
            parse_profile_list("  dev ;; q a ;\tprod; ", "default"),
            vec!["dev", "qa", "prod"]
        );
    }

    #[test]
    fn test_drops_duplicates_and_default() {
        assert_eq!(
            parse_profile_list("prod;default;dev;prod", "default"),
            vec!["prod", "dev"]
        );
    }

    #[test]
    fn test_comma_separated() {
        assert_eq!(parse_profile_list("dev, prod", "default"), vec!["dev", "prod"]);
    }

    #[test]
    fn test_only_default_is_empty() {
        assert!(parse_profile_list("default ; ", "default").is_empty());
    }
}
