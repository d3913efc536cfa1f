use std::fs;
use std::path::Path;

use blueprint_engine::AtomicFileWriter;
use engine_logging::{engine_error, engine_info, engine_warn};
use serde::{Deserialize, Serialize};

const STATE_FILENAME: &str = ".blueprint_state.ron";

/// What the client remembers between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub(crate) struct ClientMemory {
    #[serde(default)]
    pub last_hackathon_url: Option<String>,
    #[serde(default)]
    pub last_ideas_file: Option<String>,
}

pub(crate) fn load_memory(output_dir: &Path) -> ClientMemory {
    let path = output_dir.join(STATE_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return ClientMemory::default();
        }
        Err(err) => {
            engine_warn!("Failed to read client state from {:?}: {}", path, err);
            return ClientMemory::default();
        }
    };

    match ron::from_str(&content) {
        Ok(memory) => {
            engine_info!("Loaded client state from {:?}", path);
            memory
        }
        Err(err) => {
            engine_warn!("Failed to parse client state from {:?}: {}", path, err);
            ClientMemory::default()
        }
    }
}

pub(crate) fn save_memory(output_dir: &Path, memory: &ClientMemory) {
    let content = match ron::ser::to_string_pretty(memory, ron::ser::PrettyConfig::new()) {
        Ok(text) => text,
        Err(err) => {
            engine_error!("Failed to serialize client state: {}", err);
            return;
        }
    };

    let writer = AtomicFileWriter::new(output_dir);
    if let Err(err) = writer.write(STATE_FILENAME, &content) {
        engine_error!("Failed to write client state to {:?}: {}", output_dir, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_state_loads_as_default() {
        let temp = TempDir::new().unwrap();
        assert_eq!(load_memory(temp.path()), ClientMemory::default());
    }

    #[test]
    fn saved_state_round_trips_through_new_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("output");
        let memory = ClientMemory {
            last_hackathon_url: Some("https://hack.example.com/".to_string()),
            last_ideas_file: Some("hack/ideas.txt".to_string()),
        };

        save_memory(&dir, &memory);

        assert!(dir.join(STATE_FILENAME).is_file());
        assert_eq!(load_memory(&dir), memory);
    }

    #[test]
    fn corrupt_state_is_ignored() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(STATE_FILENAME), "not ron at all (").unwrap();
        assert_eq!(load_memory(temp.path()), ClientMemory::default());
    }
}
