//! Personal data that seeds the system prompt.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::ChatError;

pub const SUMMARY_FILE: &str = "summary.txt";
pub const LINKEDIN_FILE: &str = "linkedin.txt";

/// Summary and profile text loaded from the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileContext {
    pub summary: String,
    pub linkedin: String,
}

impl ProfileContext {
    pub fn new(summary: impl Into<String>, linkedin: impl Into<String>) -> Self {
        Self { summary: summary.into(), linkedin: linkedin.into() }
    }

    /// Read `summary.txt` and `linkedin.txt` from `data_dir`.
    pub fn load(data_dir: impl AsRef<Path>) -> Result<Self, ChatError> {
        let dir = data_dir.as_ref();
        let summary = read_document(dir.join(SUMMARY_FILE), "Summary file")?;
        let linkedin = read_document(dir.join(LINKEDIN_FILE), "LinkedIn profile")?;
        Ok(Self { summary, linkedin })
    }

    pub fn system_prompt(&self, name: &str) -> String {
        let mut prompt = format!(
            "You are acting as {name}. You are answering questions on {name}'s website, \
             particularly questions related to {name}'s career, background, skills and experience. \
             Your responsibility is to represent {name} for interactions on the website as faithfully as possible. \
             You are given a summary of {name}'s background and LinkedIn profile which you can use to answer questions. \
             Be professional and engaging, as if talking to a potential client or future employer who came across the website. \
             If you don't know the answer to any question, use your record_unknown_question tool to record the question that you couldn't answer, even if it's about something trivial or unrelated to career. \
             If the user is engaging in discussion, try to steer them towards getting in touch via email; ask for their email and record it using your record_user_details tool. "
        );
        prompt.push_str(&format!(
            "\n\n## Summary:\n{}\n\n## LinkedIn Profile:\n{}\n\n",
            self.summary, self.linkedin
        ));
        prompt.push_str(&format!(
            "With this context, please chat with the user, always staying in character as {name}."
        ));
        prompt
    }
}

fn read_document(path: PathBuf, what: &str) -> Result<String, ChatError> {
    if !path.exists() {
        return Err(ChatError::configuration(format!("{what} not found at: {}", path.display())));
    }
    let text = std::fs::read_to_string(&path)
        .map_err(|e| ChatError::configuration(format!("failed to read {}: {e}", path.display())))?;
    info!(path = %path.display(), chars = text.chars().count(), "loaded profile document");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_contains_sections_and_tool_names() {
        let ctx = ProfileContext::new("Builds compilers.", "Experience: 10 years");
        let prompt = ctx.system_prompt("Sam");

        assert!(prompt.starts_with("You are acting as Sam."));
        assert!(prompt.contains("record_unknown_question"));
        assert!(prompt.contains("record_user_details"));
        assert!(prompt.contains("## Summary:\nBuilds compilers."));
        assert!(prompt.contains("## LinkedIn Profile:\nExperience: 10 years"));
        assert!(prompt.ends_with("always staying in character as Sam."));
    }

    #[test]
    fn missing_directory_is_configuration_error() {
        let err = ProfileContext::load("/definitely/not/here").unwrap_err();
        assert!(matches!(err, ChatError::Configuration(ref m) if m.contains(SUMMARY_FILE)));
    }
}
