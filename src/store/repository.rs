use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::card::{CardStore, Flashcard};
use crate::error::Error;

/// File name of the collection inside the platform data directory.
pub const STUDY_FILE: &str = "study_sets.json";

/// On-disk shape of the whole collection. Rewritten wholesale on every save.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StudyFile {
    #[serde(default)]
    study_sets: BTreeMap<String, Vec<Flashcard>>,
    #[serde(default)]
    quiz_scores: BTreeMap<String, u32>,
}

/// Named study sets plus the latest quiz score per set, bound to one JSON
/// file. A missing file is an empty collection; a present but unreadable
/// file is reported, never silently replaced.
#[derive(Debug)]
pub struct StudySetRepository {
    path: PathBuf,
    sets: BTreeMap<String, Vec<Flashcard>>,
    scores: BTreeMap<String, u32>,
}

impl StudySetRepository {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let file = match fs::read_to_string(&path) {
            Ok(contents) => {
                serde_json::from_str::<StudyFile>(&contents).map_err(|source| {
                    Error::CorruptData {
                        path: path.clone(),
                        source,
                    }
                })?
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => StudyFile::default(),
            Err(err) => return Err(err.into()),
        };

        Ok(StudySetRepository {
            path,
            sets: file.study_sets,
            scores: file.quiz_scores,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert or overwrite the set under `name` and persist the collection.
    /// Empty names and empty card lists are rejected.
    pub fn save(&mut self, name: &str, cards: &[Flashcard]) -> Result<(), Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation(
                "a study set needs a non-empty name".into(),
            ));
        }
        if cards.is_empty() {
            return Err(Error::Validation(format!(
                "study set '{name}' needs at least one card"
            )));
        }

        self.sets.insert(name.to_string(), cards.to_vec());
        self.persist()
    }

    /// Set names in sorted order. Order is for display only.
    pub fn list_names(&self) -> Vec<String> {
        self.sets.keys().cloned().collect()
    }

    /// A navigable store over the named set, cursor on the first card.
    pub fn get(&self, name: &str) -> Result<CardStore, Error> {
        self.sets
            .get(name)
            .map(|cards| CardStore::from_cards(cards.clone()))
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Latest quiz score for `name`, overwriting any earlier one, persisted
    /// immediately. No history is kept.
    pub fn record_score(&mut self, name: &str, score: u32) -> Result<(), Error> {
        self.scores.insert(name.to_string(), score);
        self.persist()
    }

    pub fn score(&self, name: &str) -> Option<u32> {
        self.scores.get(name).copied()
    }

    /// `(name, card count, latest score)` per set, for the overview screens.
    pub fn summaries(&self) -> impl Iterator<Item = (&str, usize, Option<u32>)> {
        self.sets
            .iter()
            .map(|(name, cards)| (name.as_str(), cards.len(), self.score(name)))
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn total_cards(&self) -> usize {
        self.sets.values().map(Vec::len).sum()
    }

    fn persist(&self) -> Result<(), Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let file = StudyFile {
            study_sets: self.sets.clone(),
            quiz_scores: self.scores.clone(),
        };
        let contents = serde_json::to_string_pretty(&file)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(pairs: &[(&str, &str)]) -> Vec<Flashcard> {
        pairs
            .iter()
            .map(|(q, a)| Flashcard::new(*q, *a))
            .collect()
    }

    #[test]
    fn missing_file_is_an_empty_repository() {
        let dir = tempfile::tempdir().unwrap();
        let repo = StudySetRepository::load(dir.path().join(STUDY_FILE)).unwrap();
        assert!(repo.is_empty());
        assert!(repo.list_names().is_empty());
    }

    #[test]
    fn unparseable_file_is_reported_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STUDY_FILE);
        fs::write(&path, "not json").unwrap();

        let err = StudySetRepository::load(&path).unwrap_err();
        assert!(matches!(err, Error::CorruptData { .. }));
    }

    #[test]
    fn wrong_shape_is_reported_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STUDY_FILE);
        fs::write(&path, r#"{"study_sets": [1, 2, 3]}"#).unwrap();

        let err = StudySetRepository::load(&path).unwrap_err();
        assert!(matches!(err, Error::CorruptData { .. }));
    }

    #[test]
    fn save_then_load_round_trips_sets_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STUDY_FILE);

        let geography = cards(&[("Capital of France?", "Paris"), ("Capital of Peru?", "Lima")]);
        let chemistry = cards(&[("Symbol for gold?", "Au")]);

        let mut repo = StudySetRepository::load(&path).unwrap();
        repo.save("geography", &geography).unwrap();
        repo.save("chemistry", &chemistry).unwrap();

        let reloaded = StudySetRepository::load(&path).unwrap();
        assert_eq!(
            reloaded.list_names(),
            vec!["chemistry".to_string(), "geography".to_string()]
        );
        assert_eq!(reloaded.get("geography").unwrap().cards(), &geography[..]);
        assert_eq!(reloaded.get("chemistry").unwrap().cards(), &chemistry[..]);
    }

    #[test]
    fn save_rejects_empty_names_and_empty_sets() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = StudySetRepository::load(dir.path().join(STUDY_FILE)).unwrap();

        assert!(matches!(
            repo.save("  ", &cards(&[("q", "a")])),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            repo.save("geography", &[]),
            Err(Error::Validation(_))
        ));
        assert!(repo.is_empty());
    }

    #[test]
    fn saving_an_existing_name_overwrites_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STUDY_FILE);
        let mut repo = StudySetRepository::load(&path).unwrap();

        repo.save("geography", &cards(&[("old?", "old")])).unwrap();
        repo.save("geography", &cards(&[("new?", "new")])).unwrap();

        let reloaded = StudySetRepository::load(&path).unwrap();
        let store = reloaded.get("geography").unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.current().unwrap().question, "new?");
    }

    #[test]
    fn unknown_set_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let repo = StudySetRepository::load(dir.path().join(STUDY_FILE)).unwrap();
        assert!(matches!(repo.get("nope"), Err(Error::NotFound(_))));
    }

    #[test]
    fn scores_overwrite_and_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STUDY_FILE);
        let mut repo = StudySetRepository::load(&path).unwrap();
        repo.save("geography", &cards(&[("q", "a")])).unwrap();

        repo.record_score("geography", 0).unwrap();
        repo.record_score("geography", 1).unwrap();
        assert_eq!(repo.score("geography"), Some(1));

        let reloaded = StudySetRepository::load(&path).unwrap();
        assert_eq!(reloaded.score("geography"), Some(1));
        assert_eq!(reloaded.score("chemistry"), None);
    }

    #[test]
    fn unknown_top_level_keys_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STUDY_FILE);
        fs::write(
            &path,
            r#"{"study_sets": {}, "quiz_scores": {}, "schema": 1}"#,
        )
        .unwrap();

        assert!(StudySetRepository::load(&path).unwrap().is_empty());
    }
}
