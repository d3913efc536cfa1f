use serde::{Deserialize, Serialize};

/// One generated project idea as served by the ideas endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    pub number: u32,
    pub title: String,
    #[serde(default)]
    pub problem: String,
    #[serde(default)]
    pub solution: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub why_it_wins: Vec<String>,
    #[serde(default)]
    pub inspired_by: String,
    #[serde(default)]
    pub roadmap: Vec<String>,
}

/// The hackathon folder is the first path segment of an ideas file id.
pub fn hackathon_folder(ideas_file: &str) -> String {
    ideas_file
        .split(['/', '\\'])
        .next()
        .unwrap_or(ideas_file)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_is_first_segment() {
        assert_eq!(hackathon_folder("cal-hacks/ideas.txt"), "cal-hacks");
        assert_eq!(hackathon_folder("cal-hacks\\ideas.txt"), "cal-hacks");
        assert_eq!(hackathon_folder("ideas.txt"), "ideas.txt");
    }

    #[test]
    fn idea_uses_camel_case_wire_names() {
        let json = r#"{"number": 2, "title": "T", "whyItWins": ["fast"], "inspiredBy": "x"}"#;
        let idea: Idea = serde_json::from_str(json).unwrap();
        assert_eq!(idea.why_it_wins, vec!["fast".to_string()]);
        assert_eq!(idea.inspired_by, "x");
        assert!(idea.roadmap.is_empty());
    }
}
