/// Shared types used across the codebase

use serde_json::{Map, Value};

/// Untyped row: column name to JSON value.
pub type Record = Map<String, Value>;

/// Operations a table interface exposes. Used to prefix failure messages
/// and label log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GetRecords,
    GetData,
    GetNumRecords,
    GetSchema,
    GetOrder,
    GetQuery,
    GetAllRecords,
    GetRecord,
    FindRecords,
    CreateRecord,
    UpdateRecord,
    DeleteRecord,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::GetRecords => "getRecords",
            Operation::GetData => "getData",
            Operation::GetNumRecords => "getNumRecords",
            Operation::GetSchema => "getSchema",
            Operation::GetOrder => "getOrder",
            Operation::GetQuery => "getQuery",
            Operation::GetAllRecords => "getAllRecords",
            Operation::GetRecord => "getRecord",
            Operation::FindRecords => "findRecords",
            Operation::CreateRecord => "createRecord",
            Operation::UpdateRecord => "updateRecord",
            Operation::DeleteRecord => "deleteRecord",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
