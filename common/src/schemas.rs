use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body returned by the admin HTTP/JSON API for a procedure call.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProcedureResponse {
    pub status: i32,
    #[serde(default)]
    pub statusstring: Option<String>,
    #[serde(default)]
    pub results: Vec<ResultTable>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ResultTable {
    #[serde(default)]
    pub schema: Vec<ColumnInfo>,
    #[serde(default)]
    pub data: Vec<Vec<Value>>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: i32,
}

/// One `(host id, key, value)` row of a system information overview.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct InfoRow {
    pub host_id: i64,
    pub key: String,
    pub value: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemInfo {
    pub rows: Vec<InfoRow>,
}

impl ProcedureResponse {
    pub const SUCCESS: i32 = 1;

    pub fn is_success(&self) -> bool {
        self.status == Self::SUCCESS
    }

    /// Flattens the first result table into key/value rows, skipping rows
    /// that don't have the `(int, string, string)` shape.
    pub fn into_system_info(self) -> SystemInfo {
        let rows = self
            .results
            .into_iter()
            .next()
            .map(|table| table.data)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|row| match row.as_slice() {
                [Value::Number(id), Value::String(k), v] => Some(InfoRow {
                    host_id: id.as_i64()?,
                    key: k.clone(),
                    value: match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    },
                }),
                _ => None,
            })
            .collect();
        SystemInfo { rows }
    }
}

impl SystemInfo {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|r| r.key == key)
            .map(|r| r.value.as_str())
    }

    pub fn host_count(&self) -> usize {
        let mut ids: Vec<i64> = self.rows.iter().map(|r| r.host_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }
}
