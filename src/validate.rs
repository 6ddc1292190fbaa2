// Validator module - read-only structural checks, every problem is an Issue

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::LessonDoc;
use crate::models::{Answer, QuizKind};
use crate::names;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub file: String,
    pub section: String,
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}: {}", self.file, self.section, self.message)
    }
}

/// Parse and check one lesson file's contents.
pub fn validate_source(file: &str, text: &str) -> Vec<Issue> {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            return vec![Issue {
                file: file.to_owned(),
                section: "JSON".to_owned(),
                message: format!("invalid format: {e}"),
            }]
        }
    };
    match LessonDoc::from_value(value) {
        Ok(doc) => validate(file, &doc),
        Err(_) => vec![Issue {
            file: file.to_owned(),
            section: "JSON".to_owned(),
            message: "top-level value is not an object".to_owned(),
        }],
    }
}

/// Check one parsed lesson.
pub fn validate(file: &str, doc: &LessonDoc) -> Vec<Issue> {
    let mut checker = Checker {
        file,
        issues: Vec::new(),
    };

    if doc.id().is_none() {
        checker.report("lesson", "missing 'id'");
    }
    if let Some(quiz) = doc.get(names::QUIZ) {
        checker.quiz(quiz);
    }
    if let Some(practice) = doc.get(names::PRACTICE) {
        checker.required_keys(names::PRACTICE, practice, &["id", "challenge", "solution"]);
    }
    if let Some(examples) = doc.get(names::EXAMPLES) {
        checker.required_keys(
            names::EXAMPLES,
            examples,
            &["query", "description", "explanation"],
        );
    }
    if let Some(challenges) = doc.get(names::CHALLENGES) {
        checker.challenges(challenges);
    }
    let columns = checker.schema(doc.get(names::SCHEMA));
    if let Some(sample_data) = doc.get(names::SAMPLE_DATA) {
        checker.sample_data(sample_data, &columns);
    }

    checker.issues
}

/// JSON truthiness: null, false, 0, "", [] and {} are all falsy.
fn is_falsy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
    }
}

fn label(value: Option<&Value>, fallback: impl FnOnce() -> String) -> String {
    match value {
        Some(Value::String(text)) if !text.is_empty() => text.clone(),
        _ => fallback(),
    }
}

struct Checker<'a> {
    file: &'a str,
    issues: Vec<Issue>,
}

impl Checker<'_> {
    fn report(&mut self, section: impl Into<String>, message: impl Into<String>) {
        self.issues.push(Issue {
            file: self.file.to_owned(),
            section: section.into(),
            message: message.into(),
        });
    }

    /// The section as a list, reporting it when it is something else.
    fn list<'v>(&mut self, section: &str, value: &'v Value) -> Option<&'v Vec<Value>> {
        let list = value.as_array();
        if list.is_none() {
            self.report(section, format!("'{section}' is not a list"));
        }
        list
    }

    fn object<'v>(
        &mut self,
        section: &str,
        what: &str,
        value: &'v Value,
    ) -> Option<&'v Map<String, Value>> {
        let object = value.as_object();
        if object.is_none() {
            self.report(section, format!("{what} is not an object"));
        }
        object
    }

    fn quiz(&mut self, quiz: &Value) {
        let Some(items) = self.list(names::QUIZ, quiz) else {
            return;
        };
        for (i, item) in items.iter().enumerate() {
            let Some(item) = self.object(names::QUIZ, &format!("item {i}"), item) else {
                continue;
            };
            for key in ["id", "type", "question", "answer"] {
                if !item.contains_key(key) {
                    self.report(names::QUIZ, format!("item {i} missing '{key}'"));
                }
            }
            let kind = match item.get("type") {
                Some(raw) => {
                    let kind = raw.as_str().map_or_else(
                        || QuizKind::Other(raw.to_string()),
                        |k| QuizKind::from(k.to_owned()),
                    );
                    if !kind.is_known() {
                        self.report(names::QUIZ, format!("item {i} has invalid type {raw}"));
                    }
                    Some(kind)
                }
                None => None,
            };
            if kind == Some(QuizKind::TrueFalse) {
                if let Some(answer) = item.get("answer") {
                    let as_bool = Answer::deserialize(answer).ok().and_then(|a| a.as_bool());
                    if as_bool.is_none() {
                        self.report(
                            names::QUIZ,
                            format!("item {i} truefalse answer must be true or false"),
                        );
                    }
                }
            }
            match item.get("options") {
                None if kind == Some(QuizKind::Mcq) => {
                    self.report(names::QUIZ, format!("item {i} is mcq but missing 'options'"))
                }
                Some(options) if !options.is_array() => {
                    self.report(names::QUIZ, format!("item {i} 'options' is not a list"))
                }
                _ => {}
            }
        }
    }

    fn required_keys(&mut self, section: &str, value: &Value, keys: &[&str]) {
        let Some(items) = self.list(section, value) else {
            return;
        };
        for (i, item) in items.iter().enumerate() {
            let Some(item) = self.object(section, &format!("item {i}"), item) else {
                continue;
            };
            for key in keys {
                if !item.contains_key(*key) {
                    self.report(section, format!("item {i} missing '{key}'"));
                }
            }
        }
    }

    fn challenges(&mut self, challenges: &Value) {
        let Some(items) = self.list(names::CHALLENGES, challenges) else {
            return;
        };
        let mut challenge_ids = HashSet::new();
        let mut step_ids = HashSet::new();
        for (i, challenge) in items.iter().enumerate() {
            let Some(challenge) = self.object(names::CHALLENGES, &format!("item {i}"), challenge)
            else {
                continue;
            };
            if ["id", "title", "steps"]
                .iter()
                .any(|key| !challenge.contains_key(*key))
            {
                self.report(names::CHALLENGES, format!("item {i} missing id/title/steps"));
                continue;
            }
            if let Some(id) = challenge.get("id").and_then(Value::as_str) {
                if !challenge_ids.insert(id) {
                    self.report(
                        names::CHALLENGES,
                        format!("item {i} duplicates challenge id '{id}'"),
                    );
                }
            }

            let section = format!(
                "challenges[{}]",
                label(challenge.get("id"), || "?".to_owned())
            );
            let Some(steps) = challenge.get("steps").and_then(Value::as_array) else {
                self.report(section, "'steps' is not a list");
                continue;
            };
            for (j, step) in steps.iter().enumerate() {
                let Some(step) = self.object(&section, &format!("step {j}"), step) else {
                    continue;
                };
                for key in ["stepId", "description", "solution"] {
                    if !step.contains_key(key) {
                        self.report(section.clone(), format!("step {j} missing '{key}'"));
                    }
                }
                if let Some(id) = step.get("stepId").and_then(Value::as_str) {
                    if !step_ids.insert(id) {
                        self.report(
                            section.clone(),
                            format!("step {j} duplicates step id '{id}'"),
                        );
                    }
                }
            }
        }
    }

    /// Check the schema and return the declared columns of every named table.
    fn schema(&mut self, schema: Option<&Value>) -> HashMap<String, Vec<String>> {
        let mut declared = HashMap::new();
        if is_falsy(schema) {
            self.report(names::SCHEMA, "missing schema object");
            return declared;
        }
        let tables = schema
            .and_then(Value::as_object)
            .and_then(|schema| schema.get("tables"))
            .and_then(Value::as_array);
        let Some(tables) = tables else {
            self.report(names::SCHEMA, "missing or invalid 'tables' in schema");
            return declared;
        };

        for (i, table) in tables.iter().enumerate() {
            let Some(table) = self.object(names::SCHEMA, &format!("table {i}"), table) else {
                continue;
            };
            if is_falsy(table.get("name")) {
                self.report(names::SCHEMA, format!("table {i} missing 'name'"));
            }
            let table_name = label(table.get("name"), || format!("table_{i}"));
            let Some(columns) = table.get("columns").and_then(Value::as_array) else {
                self.report(
                    names::SCHEMA,
                    format!("table '{table_name}' missing or invalid 'columns' list"),
                );
                continue;
            };

            let mut names_seen = Vec::new();
            for (j, column) in columns.iter().enumerate() {
                let what = format!("column {j} in table '{table_name}'");
                let Some(column) = self.object(names::SCHEMA, &what, column) else {
                    continue;
                };
                if is_falsy(column.get("name")) {
                    self.report(names::SCHEMA, format!("{what} missing 'name'"));
                }
                if is_falsy(column.get("type")) {
                    self.report(names::SCHEMA, format!("{what} missing 'type'"));
                }
                if column.get("constraints").is_some_and(|c| !c.is_string()) {
                    let column_name = label(column.get("name"), || format!("column_{j}"));
                    self.report(
                        names::SCHEMA,
                        format!("'constraints' in column '{column_name}' must be a string"),
                    );
                }
                if let Some(name) = column.get("name").and_then(Value::as_str) {
                    names_seen.push(name.to_owned());
                }
            }
            if let Some(name) = table.get("name").and_then(Value::as_str) {
                declared.insert(name.to_owned(), names_seen);
            }
        }
        declared
    }

    fn sample_data(&mut self, sample_data: &Value, declared: &HashMap<String, Vec<String>>) {
        let Some(tables) = self.object(names::SAMPLE_DATA, "'sample_data'", sample_data) else {
            return;
        };
        for (table, rows) in tables {
            let columns = declared.get(table);
            if columns.is_none() {
                self.report(
                    names::SAMPLE_DATA,
                    format!("table '{table}' has no schema definition"),
                );
            }
            let Some(rows) = rows.as_array() else {
                self.report(names::SAMPLE_DATA, format!("rows of '{table}' are not a list"));
                continue;
            };
            for (k, row) in rows.iter().enumerate() {
                let what = format!("row {k} of '{table}'");
                let Some(row) = self.object(names::SAMPLE_DATA, &what, row) else {
                    continue;
                };
                let Some(columns) = columns else {
                    continue;
                };
                for key in row.keys() {
                    if !columns.contains(key) {
                        self.report(
                            names::SAMPLE_DATA,
                            format!("{what} has undeclared column '{key}'"),
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(value: Value) -> Vec<Issue> {
        validate("lesson_demo.json", &LessonDoc::from_value(value).unwrap())
    }

    fn messages(issues: &[Issue], section: &str) -> Vec<String> {
        issues
            .iter()
            .filter(|issue| issue.section == section)
            .map(|issue| issue.message.clone())
            .collect()
    }

    fn clean_lesson() -> Value {
        json!({
            "id": "demo",
            "quiz": [
                {"id": "demo_q1", "type": "mcq", "question": "Q?", "options": ["a", "b"], "answer": "a"},
                {"id": "demo_q2", "type": "truefalse", "question": "T?", "answer": true}
            ],
            "practice": [{"id": "demo_practice1", "challenge": "Do it", "solution": "SELECT 1;"}],
            "examples": [{"query": "SELECT 1;", "description": "d", "explanation": "e"}],
            "challenges": [{"id": "demo_ch1", "title": "T", "steps": [
                {"stepId": "demo_ch1_step1", "description": "d", "solution": "s"}
            ]}],
            "schema": {"tables": [{"name": "t", "columns": [
                {"name": "a", "type": "INTEGER", "constraints": "PRIMARY KEY"},
                {"name": "b", "type": "TEXT"}
            ]}]},
            "sample_data": {"t": [{"a": 1, "b": "x"}, {"a": 2}]}
        })
    }

    #[test]
    fn clean_lesson_has_no_issues() {
        assert_eq!(check(clean_lesson()), vec![]);
    }

    #[test]
    fn bare_mcq_item_reports_four_issues() {
        let mut lesson = clean_lesson();
        lesson["quiz"] = json!([{"type": "mcq"}]);
        let issues = check(lesson);

        assert_eq!(
            messages(&issues, "quiz"),
            vec![
                "item 0 missing 'id'",
                "item 0 missing 'question'",
                "item 0 missing 'answer'",
                "item 0 is mcq but missing 'options'",
            ]
        );
    }

    #[test]
    fn validation_does_not_mutate() {
        let doc = LessonDoc::from_value(json!({
            "quiz": [{"type": "essay"}, 3],
            "schema": {"tables": "nope"},
            "sample_data": {"ghost": [{"x": 1}]}
        }))
        .unwrap();
        let before = doc.clone();
        let issues = validate("f.json", &doc);

        assert!(!issues.is_empty());
        assert_eq!(doc, before);
    }

    #[test]
    fn malformed_json_is_a_single_issue() {
        let issues = validate_source("lesson_bad.json", "{\"id\": \"bad\",");

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].section, "JSON");
        assert!(issues[0].message.starts_with("invalid format"));
        assert_eq!(validate_source("lesson_arr.json", "[]").len(), 1);
    }

    #[test]
    fn missing_id_is_reported_and_checks_continue() {
        let mut lesson = clean_lesson();
        lesson.as_object_mut().unwrap().remove("id");
        lesson["practice"] = json!([{"id": "p"}]);
        let issues = check(lesson);

        assert_eq!(messages(&issues, "lesson"), vec!["missing 'id'"]);
        assert_eq!(
            messages(&issues, "practice"),
            vec!["item 0 missing 'challenge'", "item 0 missing 'solution'"]
        );
    }

    #[test]
    fn quiz_type_must_be_known() {
        let mut lesson = clean_lesson();
        lesson["quiz"] = json!([
            {"id": "a", "type": "fill-in-the-blank", "question": "q", "answer": "x"},
            "text"
        ]);
        let issues = check(lesson);

        assert_eq!(
            messages(&issues, "quiz"),
            vec![
                "item 0 has invalid type \"fill-in-the-blank\"",
                "item 1 is not an object"
            ]
        );
    }

    #[test]
    fn incomplete_challenge_skips_its_steps() {
        let mut lesson = clean_lesson();
        lesson["challenges"] = json!([
            {"id": "c1", "steps": [{}]},
            {"id": "c2", "title": "T", "steps": [{"stepId": "s"}, 5]}
        ]);
        let issues = check(lesson);

        assert_eq!(messages(&issues, "challenges"), vec!["item 0 missing id/title/steps"]);
        assert_eq!(
            messages(&issues, "challenges[c2]"),
            vec![
                "step 0 missing 'description'",
                "step 0 missing 'solution'",
                "step 1 is not an object"
            ]
        );
    }

    #[test]
    fn schema_problems_are_reported() {
        let mut lesson = clean_lesson();
        lesson["schema"] = json!({"tables": [
            {"name": "", "columns": [{"name": "a"}, "bad", {"type": "TEXT", "constraints": 1}]},
            {"name": "u"}
        ]});
        lesson["sample_data"] = json!({});
        let issues = check(lesson);

        assert_eq!(
            messages(&issues, "schema"),
            vec![
                "table 0 missing 'name'",
                "column 0 in table 'table_0' missing 'type'",
                "column 1 in table 'table_0' is not an object",
                "column 2 in table 'table_0' missing 'name'",
                "'constraints' in column 'column_2' must be a string",
                "table 'u' missing or invalid 'columns' list",
            ]
        );
    }

    #[test]
    fn missing_schema_is_reported_once() {
        let mut lesson = clean_lesson();
        lesson.as_object_mut().unwrap().remove("schema");
        lesson.as_object_mut().unwrap().remove("sample_data");

        assert_eq!(messages(&check(lesson.clone()), "schema"), vec!["missing schema object"]);

        lesson["schema"] = json!({"tables": {}});
        assert_eq!(
            messages(&check(lesson), "schema"),
            vec!["missing or invalid 'tables' in schema"]
        );
    }

    #[test]
    fn sample_data_must_match_the_schema() {
        let mut lesson = clean_lesson();
        lesson["sample_data"] = json!({
            "t": [{"a": 1, "c": 2}, "row"],
            "ghost": "rows"
        });
        let issues = check(lesson);

        assert_eq!(
            messages(&issues, "sample_data"),
            vec![
                "row 0 of 't' has undeclared column 'c'",
                "row 1 of 't' is not an object",
                "table 'ghost' has no schema definition",
                "rows of 'ghost' are not a list",
            ]
        );
    }

    #[test]
    fn sections_must_be_lists() {
        let mut lesson = clean_lesson();
        lesson["quiz"] = json!("x");
        lesson["examples"] = json!({"query": "SELECT 1;"});
        let issues = check(lesson);

        assert_eq!(messages(&issues, "quiz"), vec!["'quiz' is not a list"]);
        assert_eq!(messages(&issues, "examples"), vec!["'examples' is not a list"]);
    }

    #[test]
    fn mcq_options_must_be_a_list() {
        let mut lesson = clean_lesson();
        lesson["quiz"] = json!([
            {"id": "a", "type": "mcq", "question": "q", "options": "a, b", "answer": "a"}
        ]);

        assert_eq!(
            messages(&check(lesson), "quiz"),
            vec!["item 0 'options' is not a list"]
        );
    }

    #[test]
    fn truefalse_answers_accept_bool_and_text() {
        let mut lesson = clean_lesson();
        lesson["quiz"] = json!([
            {"id": "a", "type": "truefalse", "question": "q", "answer": false},
            {"id": "b", "type": "truefalse", "question": "q", "answer": "True"},
            {"id": "c", "type": "truefalse", "question": "q", "answer": "maybe"},
            {"id": "d", "type": "truefalse", "question": "q", "answer": 1}
        ]);

        assert_eq!(
            messages(&check(lesson), "quiz"),
            vec![
                "item 2 truefalse answer must be true or false",
                "item 3 truefalse answer must be true or false"
            ]
        );
    }

    #[test]
    fn challenge_steps_must_be_a_list() {
        let mut lesson = clean_lesson();
        lesson["challenges"] = json!([{"id": "c1", "title": "T", "steps": "none"}]);

        assert_eq!(
            messages(&check(lesson), "challenges[c1]"),
            vec!["'steps' is not a list"]
        );
    }

    #[test]
    fn sample_data_must_be_an_object() {
        let mut lesson = clean_lesson();
        lesson["sample_data"] = json!([{"a": 1}]);

        assert_eq!(
            messages(&check(lesson), "sample_data"),
            vec!["'sample_data' is not an object"]
        );
    }

    #[test]
    fn colliding_challenge_ids_are_reported() {
        let mut lesson = LessonDoc::from_value(json!({
            "id": "demo",
            "challenges": [
                {"id": "ch1", "title": "A", "steps": [{"description": "d", "solution": "s"}]},
                {"id": "demo_ch1", "title": "B", "steps": [{"description": "d", "solution": "s"}]}
            ]
        }))
        .unwrap();
        crate::namespace::namespace(&mut lesson).unwrap();
        let issues = validate("lesson_demo.json", &lesson);

        assert_eq!(
            messages(&issues, "challenges"),
            vec!["item 1 duplicates challenge id 'demo_ch1'"]
        );
        assert_eq!(
            messages(&issues, "challenges[demo_ch1]"),
            vec!["step 0 duplicates step id 'demo_ch1_step1'"]
        );
    }
}
