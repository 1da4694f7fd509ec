use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: usize,
    pub email: String,
    pub name: String,
    pub created: i64,
}
