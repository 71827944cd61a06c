use crate::storage::entity::{Entity, RecordMeta};
use crate::storage::error::StoreResult;
use crate::storage::schema::{FieldSchema, FieldType};
use crate::storage::value::{Record, RecordExt, Value};

/// Status given to clients created without one
pub const DEFAULT_CLIENT_STATUS: &str = "active";

/// A customer record, the application's built-in entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Client {
    meta: RecordMeta,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub status: String,
    pub notes: Option<String>,
}

impl Client {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: RecordMeta::new(),
            name: name.into(),
            email: None,
            phone: None,
            company: None,
            status: DEFAULT_CLIENT_STATUS.to_string(),
            notes: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }
}

impl Entity for Client {
    const TABLE: &'static str = "clients";

    fn fields() -> FieldSchema {
        FieldSchema::new()
            .field("name", FieldType::Text)
            .field("email", FieldType::Text)
            .field("phone", FieldType::Text)
            .field("company", FieldType::Text)
            .field("status", FieldType::Text)
            .field("notes", FieldType::Text)
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("name".into(), Value::from(self.name.clone()));
        record.insert("email".into(), Value::from(self.email.clone()));
        record.insert("phone".into(), Value::from(self.phone.clone()));
        record.insert("company".into(), Value::from(self.company.clone()));
        record.insert("status".into(), Value::from(self.status.clone()));
        record.insert("notes".into(), Value::from(self.notes.clone()));
        record
    }

    fn from_record(record: &Record) -> StoreResult<Self> {
        Ok(Self {
            meta: RecordMeta::new(),
            name: record.text("name")?,
            email: record.opt_text("email")?,
            phone: record.opt_text("phone")?,
            company: record.opt_text("company")?,
            status: record
                .opt_text("status")?
                .unwrap_or_else(|| DEFAULT_CLIENT_STATUS.to_string()),
            notes: record.opt_text("notes")?,
        })
    }
}
