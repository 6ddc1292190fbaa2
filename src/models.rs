use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Table name -> rows, each row a column -> scalar mapping.
pub type SampleData = Map<String, Value>;

/// A well-formed lesson document.
///
/// Keys the model does not know about are kept in `extra` so a lesson can be
/// read and written back without dropping author data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
    #[serde(default)]
    pub theory: Vec<TheoryBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaDef>,
    #[serde(default, rename = "sample_data")]
    pub sample_data: SampleData,
    #[serde(default)]
    pub examples: Vec<Example>,
    #[serde(default)]
    pub practice: Vec<PracticeItem>,
    #[serde(default)]
    pub quiz: Vec<QuizItem>,
    #[serde(default)]
    pub challenges: Vec<Challenge>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TheoryBlock {
    Paragraph { text: String },
    Code { text: String },
    Note { text: String },
    Warning { text: String },
    Tip { text: String },
    Table {
        #[serde(default)]
        columns: Vec<String>,
        #[serde(default)]
        rows: Vec<Vec<Value>>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDef {
    #[serde(default)]
    pub tables: Vec<TableDef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub sql_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub query: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub explanation: String,
}

/// Practice exercise. Generated lessons use `title`/`description`, hand-fixed
/// ones use `challenge`, so all three are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starter_code: Option<String>,
    pub solution: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuizKind {
    Mcq,
    TrueFalse,
    Fill,
    Other(String),
}

impl QuizKind {
    pub fn as_str(&self) -> &str {
        match self {
            QuizKind::Mcq => "mcq",
            QuizKind::TrueFalse => "truefalse",
            QuizKind::Fill => "fill",
            QuizKind::Other(kind) => kind,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, QuizKind::Other(_))
    }
}

impl From<String> for QuizKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "mcq" => QuizKind::Mcq,
            "truefalse" => QuizKind::TrueFalse,
            "fill" => QuizKind::Fill,
            _ => QuizKind::Other(kind),
        }
    }
}

impl From<QuizKind> for String {
    fn from(kind: QuizKind) -> Self {
        kind.as_str().to_owned()
    }
}

/// Quiz answers are authored both as JSON booleans and as text (`"true"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Bool(bool),
    Text(String),
}

impl Answer {
    /// Truth value of a true/false answer, whichever way it was written.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Answer::Bool(b) => Some(*b),
            Answer::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuizKind,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub answer: Answer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub step_id: String,
    pub description: String,
    pub solution: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The two sections the sample database is built from.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SampleSource {
    #[serde(default)]
    pub schema: SchemaDef,
    #[serde(default, rename = "sample_data")]
    pub sample_data: SampleData,
}
