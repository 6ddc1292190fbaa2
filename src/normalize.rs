// Normalizer module - backfills missing lesson fields with position-derived
// placeholders. Present keys are never overwritten.

use std::collections::HashMap;
use std::fmt;

use serde_json::{json, Map, Value};

use crate::document::LessonDoc;
use crate::names;

/// Which placeholder a generator produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRole {
    QuizId,
    QuizType,
    QuizQuestion,
    McqOptions,
    TrueFalseAnswer,
    FillAnswer,
    OtherAnswer,
    PracticeId,
    PracticeChallenge,
    PracticeSolution,
    PracticeHint,
    ExampleQuery,
    ExampleDescription,
    ExampleExplanation,
    ChallengeId,
    ChallengeTitle,
    StepDescription,
    StepSolution,
    TableName,
    ColumnName,
    ColumnType,
    ColumnConstraints,
}

type Generator = Box<dyn Fn(usize) -> Value + Send + Sync>;

/// Placeholder generators keyed by field role. Each generator receives the
/// 1-based position of the entry it fills.
pub struct Defaults {
    generators: HashMap<FieldRole, Generator>,
}

impl Defaults {
    /// Replace the generator for one role.
    pub fn with(
        mut self,
        role: FieldRole,
        generator: impl Fn(usize) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.generators.insert(role, Box::new(generator));
        self
    }

    pub fn value(&self, role: FieldRole, position: usize) -> Value {
        self.generators
            .get(&role)
            .map_or(Value::Null, |generator| generator(position))
    }
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            generators: HashMap::new(),
        }
        .with(FieldRole::QuizId, |n| json!(names::quiz_id(n)))
        .with(FieldRole::QuizType, |_| json!(names::MCQ))
        .with(FieldRole::QuizQuestion, |n| {
            json!(format!("Placeholder question {n}?"))
        })
        .with(FieldRole::McqOptions, |_| {
            json!(["Option A", "Option B", "Option C"])
        })
        .with(FieldRole::TrueFalseAnswer, |_| json!("true"))
        .with(FieldRole::FillAnswer, |_| json!("placeholder"))
        .with(FieldRole::OtherAnswer, |_| json!(""))
        .with(FieldRole::PracticeId, |n| json!(names::practice_id(n)))
        .with(FieldRole::PracticeChallenge, |n| {
            json!(format!("Practice question {n}"))
        })
        .with(FieldRole::PracticeSolution, |_| json!("SELECT 1;"))
        .with(FieldRole::PracticeHint, |_| json!("Try a simple query."))
        .with(FieldRole::ExampleQuery, |_| json!("SELECT * FROM employees;"))
        .with(FieldRole::ExampleDescription, |n| json!(format!("Example {n}")))
        .with(FieldRole::ExampleExplanation, |_| {
            json!("This is an example query.")
        })
        .with(FieldRole::ChallengeId, |n| json!(names::challenge_id(n)))
        .with(FieldRole::ChallengeTitle, |n| json!(format!("Challenge {n}")))
        .with(FieldRole::StepDescription, |n| {
            json!(format!("Step {n} description"))
        })
        .with(FieldRole::StepSolution, |_| json!("SELECT * FROM employees;"))
        .with(FieldRole::TableName, |_| json!("table1"))
        .with(FieldRole::ColumnName, |_| json!("column1"))
        .with(FieldRole::ColumnType, |_| json!("TEXT"))
        .with(FieldRole::ColumnConstraints, |_| json!(""))
    }
}

impl fmt::Debug for Defaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Defaults")
            .field("roles", &self.generators.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RepairOutcome {
    /// At least one key was filled in (or the entry was replaced).
    pub repaired: bool,
    /// The entry had the right shape before normalization.
    pub original_was_valid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRepair {
    /// Location inside the lesson, e.g. `challenges[1].steps[0]`.
    pub path: String,
    pub outcome: RepairOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub added_sections: Vec<&'static str>,
    pub entries: Vec<EntryRepair>,
}

impl NormalizeReport {
    pub fn changed(&self) -> bool {
        !self.added_sections.is_empty() || self.entries.iter().any(|e| e.outcome.repaired)
    }

    pub fn outcome(&self, path: &str) -> Option<RepairOutcome> {
        self.entries
            .iter()
            .find(|e| e.path == path)
            .map(|e| e.outcome)
    }

    pub fn repaired(&self) -> impl Iterator<Item = &EntryRepair> {
        self.entries.iter().filter(|e| e.outcome.repaired)
    }

    /// Entries that had the wrong shape and were replaced before defaulting.
    pub fn coerced(&self) -> impl Iterator<Item = &EntryRepair> {
        self.entries.iter().filter(|e| !e.outcome.original_was_valid)
    }
}

/// Fill every missing section and field of `doc` in place.
pub fn normalize(doc: &mut LessonDoc, defaults: &Defaults) -> NormalizeReport {
    let mut normalizer = Normalizer {
        defaults,
        report: NormalizeReport::default(),
    };
    let root = doc.root_mut();

    for section in [names::QUIZ, names::PRACTICE, names::EXAMPLES, names::CHALLENGES] {
        normalizer.ensure_section(root, section, || Value::Array(Vec::new()));
    }
    normalizer.ensure_section(root, names::SCHEMA, || json!({ "tables": [] }));
    normalizer.ensure_section(root, names::SAMPLE_DATA, || Value::Object(Map::new()));

    if let Some(Value::Array(quiz)) = root.get_mut(names::QUIZ) {
        for (i, item) in quiz.iter_mut().enumerate() {
            normalizer.quiz_item(item, i);
        }
    }
    if let Some(Value::Array(practice)) = root.get_mut(names::PRACTICE) {
        for (i, item) in practice.iter_mut().enumerate() {
            normalizer.practice_item(item, i);
        }
    }
    if let Some(Value::Array(examples)) = root.get_mut(names::EXAMPLES) {
        for (i, item) in examples.iter_mut().enumerate() {
            normalizer.example(item, i);
        }
    }
    if let Some(Value::Array(challenges)) = root.get_mut(names::CHALLENGES) {
        for (i, item) in challenges.iter_mut().enumerate() {
            normalizer.challenge(item, i);
        }
    }
    if let Some(schema) = root.get_mut(names::SCHEMA) {
        normalizer.schema(schema);
    }

    normalizer.report
}

struct Normalizer<'a> {
    defaults: &'a Defaults,
    report: NormalizeReport,
}

impl Normalizer<'_> {
    fn ensure_section(
        &mut self,
        root: &mut Map<String, Value>,
        key: &'static str,
        empty: impl Fn() -> Value,
    ) {
        if !root.contains_key(key) {
            root.insert(key.to_owned(), empty());
            self.report.added_sections.push(key);
            return;
        }
        let Some(value) = root.get_mut(key) else {
            return;
        };
        let template = empty();
        let same_shape = (value.is_array() && template.is_array())
            || (value.is_object() && template.is_object());
        if !same_shape {
            tracing::debug!(section = key, "replacing malformed section");
            *value = template;
            self.record(key.to_owned(), true, false);
        }
    }

    fn record(&mut self, path: String, repaired: bool, original_was_valid: bool) {
        self.report.entries.push(EntryRepair {
            path,
            outcome: RepairOutcome {
                repaired,
                original_was_valid,
            },
        });
    }

    fn fill(
        &self,
        map: &mut Map<String, Value>,
        key: &str,
        role: FieldRole,
        position: usize,
    ) -> bool {
        if map.contains_key(key) {
            return false;
        }
        map.insert(key.to_owned(), self.defaults.value(role, position));
        true
    }

    /// Run `fill_entry` on `slot` as an object, replacing it with `{}` first
    /// when it is not one.
    fn entry(
        &mut self,
        slot: &mut Value,
        path: String,
        fill_entry: impl FnOnce(&mut Self, &mut Map<String, Value>) -> bool,
    ) {
        let (mut map, was_object) = match std::mem::take(slot) {
            Value::Object(map) => (map, true),
            other => {
                tracing::debug!(%path, found = %other, "coercing malformed entry to an object");
                (Map::new(), false)
            }
        };
        let filled = fill_entry(self, &mut map);
        *slot = Value::Object(map);
        self.record(path, filled || !was_object, was_object);
    }

    fn quiz_item(&mut self, slot: &mut Value, index: usize) {
        let n = index + 1;
        self.entry(slot, format!("quiz[{index}]"), |this, item| {
            let mut filled = this.fill(item, "id", FieldRole::QuizId, n);
            filled |= this.fill(item, "type", FieldRole::QuizType, n);
            filled |= this.fill(item, "question", FieldRole::QuizQuestion, n);

            let kind = item
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();
            match kind.as_str() {
                names::MCQ => {
                    filled |= this.fill(item, "options", FieldRole::McqOptions, n);
                    if !item.contains_key("answer") {
                        let first = item
                            .get("options")
                            .and_then(Value::as_array)
                            .and_then(|options| options.first())
                            .cloned()
                            .unwrap_or_else(|| json!(""));
                        item.insert("answer".to_owned(), first);
                        filled = true;
                    }
                }
                names::TRUE_FALSE => {
                    filled |= this.fill(item, "answer", FieldRole::TrueFalseAnswer, n)
                }
                names::FILL => filled |= this.fill(item, "answer", FieldRole::FillAnswer, n),
                _ => filled |= this.fill(item, "answer", FieldRole::OtherAnswer, n),
            }
            filled
        });
    }

    fn practice_item(&mut self, slot: &mut Value, index: usize) {
        let n = index + 1;
        self.entry(slot, format!("practice[{index}]"), |this, item| {
            let mut filled = this.fill(item, "id", FieldRole::PracticeId, n);
            filled |= this.fill(item, "challenge", FieldRole::PracticeChallenge, n);
            filled |= this.fill(item, "solution", FieldRole::PracticeSolution, n);
            filled |= this.fill(item, "hint", FieldRole::PracticeHint, n);
            filled
        });
    }

    fn example(&mut self, slot: &mut Value, index: usize) {
        let n = index + 1;
        self.entry(slot, format!("examples[{index}]"), |this, item| {
            let mut filled = this.fill(item, "query", FieldRole::ExampleQuery, n);
            filled |= this.fill(item, "description", FieldRole::ExampleDescription, n);
            filled |= this.fill(item, "explanation", FieldRole::ExampleExplanation, n);
            filled
        });
    }

    fn challenge(&mut self, slot: &mut Value, index: usize) {
        let n = index + 1;
        let path = format!("challenges[{index}]");
        self.entry(slot, path.clone(), |this, challenge| {
            let mut filled = this.fill(challenge, "id", FieldRole::ChallengeId, n);
            filled |= this.fill(challenge, "title", FieldRole::ChallengeTitle, n);
            if !challenge.contains_key("steps") {
                challenge.insert("steps".to_owned(), Value::Array(Vec::new()));
                filled = true;
            }

            let challenge_id = challenge.get("id").map(text_of).unwrap_or_default();
            match challenge.get_mut("steps") {
                Some(Value::Array(steps)) => {
                    for (j, step) in steps.iter_mut().enumerate() {
                        this.step(step, &challenge_id, &format!("{path}.steps[{j}]"), j + 1);
                    }
                }
                Some(steps) => {
                    *steps = Value::Array(Vec::new());
                    this.record(format!("{path}.steps"), true, false);
                }
                None => {}
            }
            filled
        });
    }

    fn step(&mut self, slot: &mut Value, challenge_id: &str, path: &str, n: usize) {
        self.entry(slot, path.to_owned(), |this, step| {
            let mut filled = false;
            if !step.contains_key("stepId") {
                step.insert("stepId".to_owned(), json!(names::step_id(challenge_id, n)));
                filled = true;
            }
            filled |= this.fill(step, "description", FieldRole::StepDescription, n);
            filled |= this.fill(step, "solution", FieldRole::StepSolution, n);
            filled
        });
    }

    fn schema(&mut self, schema: &mut Value) {
        let Value::Object(schema) = schema else {
            return;
        };
        let tables_state = schema.get("tables").map(Value::is_array);
        if tables_state != Some(true) {
            schema.insert("tables".to_owned(), Value::Array(Vec::new()));
            let path = if tables_state.is_none() { "schema" } else { "schema.tables" };
            self.record(path.to_owned(), true, tables_state.is_none());
        }

        let Some(Value::Array(tables)) = schema.get_mut("tables") else {
            return;
        };
        for (i, table) in tables.iter_mut().enumerate() {
            let path = format!("schema.tables[{i}]");
            self.entry(table, path.clone(), |this, table| {
                let mut filled = this.fill(table, "name", FieldRole::TableName, i + 1);
                match table.get("columns").map(Value::is_array) {
                    Some(true) => {}
                    Some(false) => {
                        table.insert("columns".to_owned(), Value::Array(Vec::new()));
                        this.record(format!("{path}.columns"), true, false);
                    }
                    None => {
                        table.insert("columns".to_owned(), Value::Array(Vec::new()));
                        filled = true;
                    }
                }

                if let Some(Value::Array(columns)) = table.get_mut("columns") {
                    for (j, column) in columns.iter_mut().enumerate() {
                        let n = j + 1;
                        let column_path = format!("{path}.columns[{j}]");
                        this.entry(column, column_path, |this, column| {
                            let mut filled = this.fill(column, "name", FieldRole::ColumnName, n);
                            filled |= this.fill(column, "type", FieldRole::ColumnType, n);
                            filled |=
                                this.fill(column, "constraints", FieldRole::ColumnConstraints, n);
                            filled
                        });
                    }
                }
                filled
            });
        }
    }
}

/// Display text of a JSON value, without quotes for strings.
fn text_of(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
