//! Persona reference material and system instruction
//!
//! The profile and biography are read once at startup and never reloaded.
//! The profile is a text rendition of the source document with pages
//! separated by form feeds, as PDF-to-text extractors emit it.

use crate::error::AgentError;
use crate::Result;
use std::fs;
use std::path::Path;
use tracing::info;

const PAGE_BREAK: char = '\x0c';

/// The person the agent speaks for, plus what it knows about them
#[derive(Debug, Clone)]
pub struct Persona {
    pub name: String,
    pub profile: String,
    pub biography: String,
}

impl Persona {
    pub fn new(name: impl Into<String>, profile: impl Into<String>, biography: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            profile: profile.into(),
            biography: biography.into(),
        }
    }

    /// Read the reference documents from disk
    pub fn load(name: &str, profile_path: &Path, biography_path: &Path) -> Result<Self> {
        let profile = join_pages(&read_document(profile_path)?);
        let biography = read_document(biography_path)?;

        info!(
            persona = %name,
            profile_chars = profile.len(),
            biography_chars = biography.len(),
            "Reference documents loaded"
        );

        Ok(Self::new(name, profile, biography))
    }

    /// Build the system instruction for one turn.
    ///
    /// `user_details` is the rendered session memory; an empty string
    /// leaves the section out.
    pub fn system_prompt(&self, user_details: &str) -> String {
        let name = &self.name;

        let mut prompt = format!(
            "You are acting as {name}. You are answering questions on {name}'s website, \
particularly questions related to {name}'s career, background, skills and experience. \
Your responsibility is to represent {name} for interactions on the website as faithfully as possible. \
You are given a summary of {name}'s background and LinkedIn profile which you can use to answer questions. \
Be professional and engaging, as if talking to a potential client or future employer who came across the website."
        );

        if !user_details.trim().is_empty() {
            prompt.push_str("\n\nUser details:\n");
            prompt.push_str(user_details);
        }

        prompt.push_str(&format!(
            "\n\nHere is {name}'s LinkedIn profile:\n{}\n\n",
            self.profile
        ));
        prompt.push_str(&format!(
            "Here is extra information about {name}:\n{}\n\n",
            self.biography
        ));

        prompt.push_str(&format!(
            "If you don't know the answer to any question, use your record_unknown_question tool to record the question \
that you couldn't answer, even if it's about something trivial or unrelated to career. \
If the user is engaging in discussion, try to steer them towards getting in touch via email; \
ask for their email and record it using your record_user_detail tool. \
If the user provides their name, email, or notes at any time, immediately call the remember_user_details tool \
to store this information. \
If you already know the user's email or details from earlier in the session, do not ask again.\n\n\
With this context, please chat with the user, always staying in character as {name}."
        ));

        prompt
    }
}

fn read_document(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        AgentError::Config(format!(
            "Failed to read reference document {}: {}",
            path.display(),
            e
        ))
    })
}

/// Concatenate the non-empty pages of an extracted document, in order
pub fn join_pages(raw: &str) -> String {
    raw.split(PAGE_BREAK)
        .filter(|page| !page.trim().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn persona() -> Persona {
        Persona::new("Jo Example", "Staff engineer at Acme.", "Jo grew up by the sea.")
    }

    #[test]
    fn test_join_pages_skips_empty_pages() {
        let raw = "Page one\n\x0c   \n\x0cPage three\n\x0c";
        assert_eq!(join_pages(raw), "Page one\nPage three\n");
    }

    #[test]
    fn test_prompt_section_order() {
        let prompt = persona().system_prompt("Email: a@b.com, Name: Alex, Notes: not provided\n");

        let persona_at = prompt.find("You are acting as Jo Example").unwrap();
        let details_at = prompt.find("User details:\nEmail: a@b.com").unwrap();
        let profile_at = prompt.find("Staff engineer at Acme.").unwrap();
        let bio_at = prompt.find("Jo grew up by the sea.").unwrap();
        let directives_at = prompt.find("record_unknown_question").unwrap();

        assert!(persona_at < details_at);
        assert!(details_at < profile_at);
        assert!(profile_at < bio_at);
        assert!(bio_at < directives_at);
        assert!(prompt.contains("remember_user_details"));
        assert!(prompt.contains("record_user_detail tool"));
    }

    #[test]
    fn test_prompt_without_user_details() {
        let prompt = persona().system_prompt("");
        assert!(!prompt.contains("User details:"));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = std::env::temp_dir().join(format!("persona-load-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();

        let profile_path = dir.join("profile.txt");
        let mut profile = fs::File::create(&profile_path).unwrap();
        write!(profile, "Experience\x0c\x0cEducation").unwrap();
        fs::write(dir.join("about.txt"), "Hello there.\n").unwrap();

        let loaded = Persona::load("Jo Example", &profile_path, &dir.join("about.txt")).unwrap();
        assert_eq!(loaded.profile, "ExperienceEducation");
        assert_eq!(loaded.biography, "Hello there.\n");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_document_is_config_error() {
        let missing = Path::new("/definitely/not/here/profile.txt");
        let err = Persona::load("Jo Example", missing, missing).unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
    }
}
