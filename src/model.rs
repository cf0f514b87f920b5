use std::collections::{BTreeSet, HashMap};

use crate::util::sha256_text;

#[derive(Debug, Clone)]
pub struct LogFile {
    pub name: String,
    pub text: String,
    pub sha256: String,
}

impl LogFile {
    pub fn new(name: String, text: String) -> Self {
        let sha256 = sha256_text(&text);
        Self { name, text, sha256 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suite {
    pub name: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SectionMap {
    suites: Vec<Suite>,
}

impl SectionMap {
    // A duplicate name within one pass replaces the lines but keeps position.
    pub fn commit(&mut self, name: String, lines: Vec<String>) {
        match self.suites.iter_mut().find(|suite| suite.name == name) {
            Some(existing) => existing.lines = lines,
            None => self.suites.push(Suite { name, lines }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.suites
            .iter()
            .find(|suite| suite.name == name)
            .map(|suite| suite.lines.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.suites.iter().map(|suite| suite.name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Suite> {
        self.suites.iter()
    }

    pub fn len(&self) -> usize {
        self.suites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }
}

impl IntoIterator for SectionMap {
    type Item = Suite;
    type IntoIter = std::vec::IntoIter<Suite>;

    fn into_iter(self) -> Self::IntoIter {
        self.suites.into_iter()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BaselineSuite {
    pub lines: Vec<String>,
    pub sources: BTreeSet<String>,
}

#[derive(Debug, Default)]
pub struct SuiteIndex {
    order: Vec<String>,
    entries: HashMap<String, BaselineSuite>,
}

impl SuiteIndex {
    pub fn merge(&mut self, source: &str, sections: SectionMap) {
        for suite in sections {
            if !self.entries.contains_key(&suite.name) {
                self.order.push(suite.name.clone());
            }

            let entry = self.entries.entry(suite.name).or_default();
            entry.lines.extend(suite.lines);
            entry.sources.insert(source.to_string());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&BaselineSuite> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Exact(String),
    Fuzzy { matched: String, ratio: f64 },
    NoMatch,
}

#[cfg(test)]
mod tests {
    use super::{SectionMap, SuiteIndex};

    fn lines(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn section_map_replaces_duplicate_and_keeps_position() {
        let mut sections = SectionMap::default();
        sections.commit("alpha".to_string(), lines(&["one"]));
        sections.commit("beta".to_string(), lines(&["two"]));
        sections.commit("alpha".to_string(), lines(&["three"]));

        assert_eq!(sections.len(), 2);
        assert_eq!(sections.names().collect::<Vec<_>>(), vec!["alpha", "beta"]);
        assert_eq!(sections.get("alpha"), Some(lines(&["three"]).as_slice()));
    }

    #[test]
    fn suite_index_accumulates_lines_and_sources_across_files() {
        let mut first = SectionMap::default();
        first.commit("login".to_string(), lines(&["TEST: login succeeds"]));

        let mut second = SectionMap::default();
        second.commit("login".to_string(), lines(&["not ok 1 - login"]));
        second.commit("build".to_string(), lines(&["TEST: build passes"]));

        let mut index = SuiteIndex::default();
        index.merge("b.tap", first);
        index.merge("a.tap", second);

        assert_eq!(index.len(), 2);
        assert_eq!(index.names().collect::<Vec<_>>(), vec!["login", "build"]);

        let login = index.get("login").expect("login suite should be indexed");
        assert_eq!(
            login.lines,
            lines(&["TEST: login succeeds", "not ok 1 - login"])
        );
        assert_eq!(
            login.sources.iter().collect::<Vec<_>>(),
            vec!["a.tap", "b.tap"]
        );
    }
}
