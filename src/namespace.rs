// Namespacer module - derives practice, quiz, challenge and step ids from the
// owning lesson's id

use std::fmt;

use serde_json::{Map, Value};

use crate::document::LessonDoc;
use crate::names;

/// The lesson has no usable `id`; nothing was rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingLessonId;

impl fmt::Display for MissingLessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing lesson id")
    }
}

impl std::error::Error for MissingLessonId {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub path: String,
    pub from: Option<String>,
    pub to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceReport {
    pub renames: Vec<Rename>,
}

impl NamespaceReport {
    pub fn changed(&self) -> bool {
        !self.renames.is_empty()
    }
}

/// Rewrite every practice, quiz, challenge and step id in `doc`.
pub fn namespace(doc: &mut LessonDoc) -> Result<NamespaceReport, MissingLessonId> {
    let lesson_id = doc.id().ok_or(MissingLessonId)?.to_owned();
    let prefix = names::namespace_prefix(&lesson_id);
    let mut report = NamespaceReport::default();

    for (i, item) in objects_mut(doc.get_mut(names::PRACTICE)) {
        let id = names::namespaced(&lesson_id, &names::practice_id(i + 1));
        report.set(item, "id", id, format!("practice[{i}]"));
    }

    for (i, item) in objects_mut(doc.get_mut(names::QUIZ)) {
        let id = names::namespaced(&lesson_id, &names::quiz_id(i + 1));
        report.set(item, "id", id, format!("quiz[{i}]"));
    }

    for (i, challenge) in objects_mut(doc.get_mut(names::CHALLENGES)) {
        let local = match challenge.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.strip_prefix(&prefix).unwrap_or(id).to_owned(),
            _ => names::challenge_id(i + 1),
        };
        let challenge_id = names::namespaced(&lesson_id, &local);
        report.set(challenge, "id", challenge_id.clone(), format!("challenges[{i}]"));

        for (j, step) in objects_mut(challenge.get_mut("steps")) {
            let step_id = names::step_id(&challenge_id, j + 1);
            report.set(step, "stepId", step_id, format!("challenges[{i}].steps[{j}]"));
        }
    }

    if report.changed() {
        tracing::debug!(lesson = %lesson_id, renamed = report.renames.len(), "namespaced ids");
    }
    Ok(report)
}

impl NamespaceReport {
    fn set(&mut self, entry: &mut Map<String, Value>, key: &str, id: String, path: String) {
        let current = entry.get(key);
        if current.and_then(Value::as_str) == Some(id.as_str()) {
            return;
        }
        let from = current.map(|value| match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        });
        entry.insert(key.to_owned(), Value::String(id.clone()));
        self.renames.push(Rename { path, from, to: id });
    }
}

/// Object entries of a list section with their positions. Anything that is
/// not an object is left for the normalizer.
fn objects_mut(
    section: Option<&mut Value>,
) -> impl Iterator<Item = (usize, &mut Map<String, Value>)> {
    section
        .and_then(Value::as_array_mut)
        .into_iter()
        .flat_map(|items| items.iter_mut().enumerate())
        .filter_map(|(i, item)| item.as_object_mut().map(|map| (i, map)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> LessonDoc {
        LessonDoc::from_value(value).unwrap()
    }

    fn ids(doc: &LessonDoc, section: &str) -> Vec<String> {
        doc.get(section)
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["id"].as_str().unwrap().to_owned())
            .collect()
    }

    #[test]
    fn ids_are_derived_from_lesson_and_position() {
        let mut lesson = doc(json!({
            "id": "demo",
            "practice": [{"id": "practice_1"}, {"id": "whatever"}, {}],
            "quiz": [{"id": "q1"}, {"id": "other"}]
        }));
        namespace(&mut lesson).unwrap();

        assert_eq!(
            ids(&lesson, "practice"),
            vec!["demo_practice1", "demo_practice2", "demo_practice3"]
        );
        assert_eq!(ids(&lesson, "quiz"), vec!["demo_q1", "demo_q2"]);
    }

    #[test]
    fn namespacing_twice_is_a_no_op() {
        let mut lesson = doc(json!({
            "id": "joins",
            "practice": [{}, {}],
            "quiz": [{"id": "x"}],
            "challenges": [{"id": "ch1", "steps": [{"stepId": "s"}, {}]}]
        }));
        let first = namespace(&mut lesson).unwrap();
        let once = lesson.clone();
        let second = namespace(&mut lesson).unwrap();

        assert!(first.changed());
        assert!(!second.changed());
        assert_eq!(once, lesson);
        for id in ids(&lesson, "practice").iter().chain(ids(&lesson, "quiz").iter()) {
            assert!(id.starts_with("joins_"), "{id}");
        }
    }

    #[test]
    fn challenge_prefix_is_never_doubled() {
        let mut lesson = doc(json!({
            "id": "demo",
            "challenges": [
                {"id": "ch1", "steps": [{"stepId": "old"}, {"stepId": "demo_ch1_step2"}]},
                {"id": "demo_ch2", "steps": []},
                {"steps": [{}]}
            ]
        }));
        let report = namespace(&mut lesson).unwrap();

        let challenges = lesson.get("challenges").unwrap();
        assert_eq!(challenges[0]["id"], "demo_ch1");
        assert_eq!(challenges[0]["steps"][0]["stepId"], "demo_ch1_step1");
        assert_eq!(challenges[0]["steps"][1]["stepId"], "demo_ch1_step2");
        assert_eq!(challenges[1]["id"], "demo_ch2");
        assert_eq!(challenges[2]["id"], "demo_ch3");
        assert_eq!(challenges[2]["steps"][0]["stepId"], "demo_ch3_step1");

        let paths: Vec<_> = report.renames.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "challenges[0]",
                "challenges[0].steps[0]",
                "challenges[2]",
                "challenges[2].steps[0]"
            ]
        );
    }

    #[test]
    fn lesson_without_id_is_left_alone() {
        let original = json!({"quiz": [{"id": "q1"}], "id": ""});
        let mut lesson = doc(original.clone());

        assert_eq!(namespace(&mut lesson), Err(MissingLessonId));
        assert_eq!(lesson.into_value(), original);
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let mut lesson = doc(json!({"id": "demo", "quiz": ["text", {"id": "q"}], "practice": "none"}));
        namespace(&mut lesson).unwrap();

        let quiz = lesson.get("quiz").unwrap();
        assert_eq!(quiz[0], "text");
        assert_eq!(quiz[1]["id"], "demo_q2");
        assert_eq!(lesson.get("practice"), Some(&json!("none")));
    }
}
