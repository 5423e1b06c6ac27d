#![allow(dead_code)]

use chrono::{NaiveDate, Utc};
use docmap::{memory::InMemoryStore, prelude::*};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default = "default_money")]
    pub money: f64,
    #[serde(default = "today")]
    pub birthday: NaiveDate,
}

fn default_money() -> f64 {
    200.0
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

impl Default for UserInfo {
    fn default() -> Self {
        Self { money: default_money(), birthday: today() }
    }
}

impl UserInfo {
    pub fn with_money(money: f64) -> Self {
        Self { money, ..Self::default() }
    }
}

impl Schema for UserInfo {
    fn schema_name() -> &'static str {
        "UserInfo"
    }

    fn fields() -> Vec<FieldDef> {
        vec![
            FieldDef::new("money", FieldKind::Float),
            FieldDef::new("birthday", FieldKind::DateTime),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default = "default_age")]
    pub age: i64,
    #[serde(default)]
    pub info: UserInfo,
}

fn default_age() -> i64 {
    18
}

impl User {
    pub fn new(name: &str, age: i64, info: UserInfo) -> Self {
        Self { id: 0, name: name.to_string(), age, info }
    }
}

impl Schema for User {
    const PRIMARY_KEY: Option<&'static str> = Some("id");

    fn schema_name() -> &'static str {
        "User"
    }

    fn fields() -> Vec<FieldDef> {
        vec![
            FieldDef::new("name", FieldKind::String),
            FieldDef::new("age", FieldKind::Int),
            FieldDef::embedded::<UserInfo>("info"),
        ]
    }
}

impl Document for User {
    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn meta() -> Option<MetaConfig> {
        Some(MetaConfig::new().with_name("user"))
    }
}

pub fn database() -> Database {
    Database::new(InMemoryStore::new())
}

pub fn users(db: &Database) -> Model<User> {
    Model::<User>::define_with(MetaConfig::new().with_db(db.clone())).unwrap()
}

/// A bound model holding `Ax` (15), `Axy` (18, 300), `Az` (20) and `By` (40, 300).
pub fn seeded() -> (Model<User>, Vec<User>) {
    let model = users(&database());
    let mut seeded = vec![
        User::new("Ax", 15, UserInfo::default()),
        User::new("Axy", 18, UserInfo::with_money(300.0)),
        User::new("Az", 20, UserInfo::default()),
        User::new("By", 40, UserInfo::with_money(300.0)),
    ];
    for user in seeded.iter_mut() {
        model.insert(user).unwrap();
    }
    (model, seeded)
}
