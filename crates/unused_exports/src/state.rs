use std::path::PathBuf;

use ahashmap::AHashSet;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The listed symbols have no known use outside their module.
    PotentiallyUnused,
    /// Every export of the module counts as used.
    DefinitelyUsed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSymbol {
    pub name: String,
    pub line: Option<u32>,
    pub used_in_module: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub module: PathBuf,
    pub classification: Classification,
    pub symbols: Vec<ResultSymbol>,
}

/// All analysis results of one run, in emission order.
#[derive(Debug, Default)]
pub struct ProjectState {
    results: Vec<AnalysisResult>,
}

impl ProjectState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_result(&mut self, result: AnalysisResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[AnalysisResult] {
        &self.results
    }

    /// The potentially unused results of modules that were never marked
    /// definitely used, minus those with nothing left to report.
    pub fn definitely_unused(&self) -> Vec<&AnalysisResult> {
        let used = self
            .results
            .iter()
            .filter(|r| r.classification == Classification::DefinitelyUsed)
            .map(|r| &r.module)
            .collect::<AHashSet<_>>();

        self.results
            .iter()
            .filter(|r| r.classification == Classification::PotentiallyUnused)
            .filter(|r| !used.contains(&r.module))
            .filter(|r| !r.symbols.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn result(module: &str, classification: Classification, names: &[&str]) -> AnalysisResult {
        AnalysisResult {
            module: PathBuf::from(module),
            classification,
            symbols: names
                .iter()
                .map(|name| ResultSymbol {
                    name: name.to_string(),
                    line: Some(1),
                    used_in_module: false,
                })
                .collect(),
        }
    }

    #[test]
    fn test_definitely_used_wins_regardless_of_order() {
        let emitted = vec![
            result("/p/a.ts", Classification::PotentiallyUnused, &["x"]),
            result("/p/b.ts", Classification::PotentiallyUnused, &["y"]),
            result("/p/c.ts", Classification::PotentiallyUnused, &[]),
            result("/p/a.ts", Classification::DefinitelyUsed, &[]),
        ];

        let mut forward = ProjectState::new();
        emitted.iter().cloned().for_each(|r| forward.on_result(r));
        let mut backward = ProjectState::new();
        emitted.iter().rev().cloned().for_each(|r| backward.on_result(r));

        let expected = vec![result("/p/b.ts", Classification::PotentiallyUnused, &["y"])];
        assert_eq!(
            forward.definitely_unused().into_iter().cloned().collect::<Vec<_>>(),
            expected
        );
        assert_eq!(
            backward.definitely_unused().into_iter().cloned().collect::<Vec<_>>(),
            expected
        );
        assert_eq!(forward.results().len(), 4);
    }
}
