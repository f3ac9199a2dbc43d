//! Static tool catalog and argument decoding for tool calls.

use std::sync::Arc;

use rmcp::model::{JsonObject, Tool};
use serde_json::{json, Value};

use crate::domain::{
    error::TodoError,
    todo::{NewTodo, TodoId},
};

pub const CREATE_TODO: &str = "create_todo";
pub const MARK_TODO_DONE: &str = "mark_todo_done";
pub const GET_ALL_TODOS: &str = "get_all_todos";
pub const DELETE_TODO: &str = "delete_todo";

pub fn catalog() -> Vec<Tool> {
    vec![
        Tool::new(
            CREATE_TODO,
            "Create a new todo item",
            schema(json!({
                "type": "object",
                "properties": {
                    "title": { "type": "string", "description": "Title of the todo" },
                    "content": { "type": "string", "description": "Content of the todo" }
                },
                "required": ["title", "content"]
            })),
        ),
        Tool::new(
            MARK_TODO_DONE,
            "Mark a todo item as done or not done",
            schema(json!({
                "type": "object",
                "properties": {
                    "id": { "type": "string", "description": "ID of the todo" },
                    "done": { "type": "boolean", "description": "Whether the todo is done" }
                },
                "required": ["id", "done"]
            })),
        ),
        Tool::new(
            GET_ALL_TODOS,
            "List every todo with its done state",
            schema(json!({ "type": "object", "properties": {} })),
        ),
        Tool::new(
            DELETE_TODO,
            "Delete a todo item; remaining todos are renumbered from 1",
            schema(json!({
                "type": "object",
                "properties": {
                    "id": { "type": "string", "description": "ID of the todo to delete" }
                },
                "required": ["id"]
            })),
        ),
    ]
}

fn schema(value: Value) -> Arc<JsonObject> {
    match value {
        Value::Object(map) => Arc::new(map),
        _ => Arc::default(),
    }
}

pub fn new_todo(args: &JsonObject) -> NewTodo {
    NewTodo { title: text_arg(args, "title"), content: text_arg(args, "content") }
}

/// Scalars are accepted as text; anything else reads as empty.
fn text_arg(args: &JsonObject, key: &str) -> String {
    match args.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

pub fn id_arg(args: &JsonObject) -> Result<TodoId, TodoError> {
    let id = text_arg(args, "id");
    if id.is_empty() {
        return Err(TodoError::InvalidArgument("Todo id is required".into()));
    }
    Ok(TodoId(id))
}

pub fn done_arg(args: &JsonObject) -> Result<bool, TodoError> {
    match args.get("done") {
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) if s == "true" => Ok(true),
        Some(Value::String(s)) if s == "false" => Ok(false),
        _ => Err(TodoError::InvalidArgument("done must be true or false".into())),
    }
}
