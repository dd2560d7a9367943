//! Core types for the task board engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Presentation tag for a board. Opaque to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardKind {
    #[default]
    General,
    Property,
    Project,
    Crm,
}

impl BoardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoardKind::General => "general",
            BoardKind::Property => "property",
            BoardKind::Project => "project",
            BoardKind::Crm => "crm",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "general" => Some(BoardKind::General),
            "property" => Some(BoardKind::Property),
            "project" => Some(BoardKind::Project),
            "crm" => Some(BoardKind::Crm),
            _ => None,
        }
    }
}

/// A task board, scoped to exactly one tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub kind: BoardKind,
    /// When set, every member of the tenant may view the board.
    pub public_readable: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// The type of a column. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnType {
    Text,
    Number,
    Money,
    Date,
    Status,
    Person,
    Checkbox,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Number => "NUMBER",
            ColumnType::Money => "MONEY",
            ColumnType::Date => "DATE",
            ColumnType::Status => "STATUS",
            ColumnType::Person => "PERSON",
            ColumnType::Checkbox => "CHECKBOX",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "TEXT" => Some(ColumnType::Text),
            "NUMBER" => Some(ColumnType::Number),
            "MONEY" => Some(ColumnType::Money),
            "DATE" => Some(ColumnType::Date),
            "STATUS" => Some(ColumnType::Status),
            "PERSON" => Some(ColumnType::Person),
            "CHECKBOX" => Some(ColumnType::Checkbox),
            _ => None,
        }
    }
}

/// One selectable option of a STATUS column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusOption {
    pub id: String,
    pub label: String,
    pub color: String,
}

/// Type-specific column settings. Only STATUS columns carry options today.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSettings {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<StatusOption>,
}

impl ColumnSettings {
    pub fn with_options(options: Vec<StatusOption>) -> Self {
        Self { options }
    }

    pub fn option(&self, id: &str) -> Option<&StatusOption> {
        self.options.iter().find(|o| o.id == id)
    }

    pub fn option_ids(&self) -> Vec<String> {
        self.options.iter().map(|o| o.id.clone()).collect()
    }
}

/// A board-level declaration of one typed attribute tasks may carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub board_id: String,
    pub name: String,
    pub column_type: ColumnType,
    pub settings: ColumnSettings,
    pub width: i32,
    pub position: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Partial update of a column. The type is intentionally absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnPatch {
    pub name: Option<String>,
    pub width: Option<i32>,
    pub settings: Option<ColumnSettings>,
    pub position: Option<i32>,
}

/// A validated field value. The variant always matches the owning column's type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Money(f64),
    /// ISO date or date-time string.
    Date(Option<String>),
    /// Option id.
    Status(Option<String>),
    /// Member id.
    Person(Option<String>),
    Checkbox(bool),
}

impl FieldValue {
    pub fn column_type(&self) -> ColumnType {
        match self {
            FieldValue::Text(_) => ColumnType::Text,
            FieldValue::Number(_) => ColumnType::Number,
            FieldValue::Money(_) => ColumnType::Money,
            FieldValue::Date(_) => ColumnType::Date,
            FieldValue::Status(_) => ColumnType::Status,
            FieldValue::Person(_) => ColumnType::Person,
            FieldValue::Checkbox(_) => ColumnType::Checkbox,
        }
    }

    /// The untagged JSON shape stored in the database and accepted from clients.
    pub fn to_raw(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Number(n) | FieldValue::Money(n) => serde_json::json!(n),
            FieldValue::Date(v) | FieldValue::Status(v) | FieldValue::Person(v) => match v {
                Some(s) => Value::String(s.clone()),
                None => Value::Null,
            },
            FieldValue::Checkbox(b) => Value::Bool(*b),
        }
    }

    /// True for the nullable variants holding no value.
    pub fn is_unset(&self) -> bool {
        matches!(
            self,
            FieldValue::Date(None) | FieldValue::Status(None) | FieldValue::Person(None)
        )
    }

    /// The selected option id, for STATUS values.
    pub fn status_option(&self) -> Option<&str> {
        match self {
            FieldValue::Status(Some(id)) => Some(id.as_str()),
            _ => None,
        }
    }
}

/// A field value as stored, with its version token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredValue {
    pub value: FieldValue,
    /// 1 on first write, incremented on every overwrite.
    pub version: i64,
    pub updated_at: i64,
}

/// An ordered, collapsible bucket of tasks within a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub board_id: String,
    pub name: String,
    pub color: String,
    pub collapsed: bool,
    pub position: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub collapsed: Option<bool>,
}

/// A single row within a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub group_id: String,
    pub name: String,
    pub position: i32,
    /// Field values keyed by column id. At most one per column.
    #[serde(default)]
    pub values: BTreeMap<String, StoredValue>,
    /// Maintained by the comments subsystem; read-only here.
    pub comment_count: i64,
    /// Maintained by sub-item tracking; read-only here.
    pub subitem_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Task {
    pub fn value(&self, column_id: &str) -> Option<&FieldValue> {
        self.values.get(column_id).map(|v| &v.value)
    }
}

/// Rename and/or move a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub position: Option<i32>,
    pub group_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardPatch {
    pub name: Option<String>,
    pub kind: Option<BoardKind>,
    pub public_readable: Option<bool>,
}

/// Tenant-relative role of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Admin,
    Manager,
    Staff,
    /// Tenant member without edit rights.
    Member,
    /// Customer-scoped account; sees public-readable boards only.
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Staff => "staff",
            Role::Member => "member",
            Role::Customer => "customer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "owner" => Some(Role::Owner),
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "staff" => Some(Role::Staff),
            "member" => Some(Role::Member),
            "customer" => Some(Role::Customer),
            _ => None,
        }
    }

    /// Roles that may edit boards without an override.
    pub fn is_elevated(&self) -> bool {
        matches!(self, Role::Owner | Role::Admin | Role::Manager | Role::Staff)
    }

    pub fn is_customer_scoped(&self) -> bool {
        matches!(self, Role::Customer)
    }
}

/// An already-authenticated caller, supplied by the session layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub actor_id: String,
    pub role: Role,
    pub tenant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_edit_override: Option<bool>,
}

impl Actor {
    pub fn new(actor_id: impl Into<String>, role: Role, tenant_id: impl Into<String>) -> Self {
        Self {
            actor_id: actor_id.into(),
            role,
            tenant_id: tenant_id.into(),
            can_edit_override: None,
        }
    }

    pub fn with_edit_override(mut self, can_edit: bool) -> Self {
        self.can_edit_override = Some(can_edit);
        self
    }
}

/// A tenant member, used to resolve PERSON values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// A group with its ordered tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupView {
    #[serde(flatten)]
    pub group: Group,
    pub tasks: Vec<Task>,
}

/// The composed board tree returned to a requesting actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardView {
    pub board: Board,
    pub columns: Vec<Column>,
    pub groups: Vec<GroupView>,
    pub members: Vec<Member>,
    pub can_edit: bool,
}

impl BoardView {
    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.groups
            .iter()
            .flat_map(|g| g.tasks.iter())
            .find(|t| t.id == task_id)
    }

    pub fn task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.groups
            .iter_mut()
            .flat_map(|g| g.tasks.iter_mut())
            .find(|t| t.id == task_id)
    }

    pub fn column(&self, column_id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == column_id)
    }

    /// All tasks in group order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.groups.iter().flat_map(|g| g.tasks.iter())
    }
}

/// Count for one stage of a STATUS column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCount {
    pub option_id: String,
    pub label: String,
    pub color: String,
    pub count: usize,
}

/// Per-stage counts for a STATUS column, in option order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageBreakdown {
    pub column_id: String,
    pub stages: Vec<StageCount>,
    pub total_tasks: usize,
    /// Tasks left out of every stage (unset or unknown option).
    pub excluded: usize,
}
