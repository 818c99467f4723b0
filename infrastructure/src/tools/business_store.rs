//! In-memory business records backing the sample tool families.
//!
//! Holds tasks, invoices and reminders per user. Every query is scoped to
//! the acting user, so one user's records are invisible to another. The
//! store also implements [`EntityResolver`] so confirmation prompts can show
//! task names instead of ids.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use ledger_application::ports::entity_resolver::EntityResolver;
use ledger_domain::UserId;
use serde::Serialize;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    #[serde(skip)]
    pub user_id: UserId,
    pub name: String,
    pub client: String,
    pub hourly_rate: f64,
    pub logged_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    #[serde(skip)]
    pub user_id: UserId,
    pub task_id: String,
    pub client: String,
    pub hours: f64,
    pub rate: f64,
    pub total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    #[serde(skip)]
    pub user_id: UserId,
    pub title: String,
    pub due_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields of an invoice about to be issued.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub task_id: String,
    pub hours: f64,
    pub rate: f64,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

#[derive(Debug, Default)]
struct Records {
    tasks: Vec<Task>,
    invoices: Vec<Invoice>,
    reminders: Vec<Reminder>,
    next_invoice: u64,
    next_reminder: u64,
}

#[derive(Debug, Default)]
pub struct BusinessStore {
    records: RwLock<Records>,
}

impl BusinessStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-filled with a few tasks for `user_id`.
    pub fn with_sample_data(user_id: &UserId) -> Self {
        let tasks = [
            ("t1", "Website redesign", "Acme Corp", 95.0, 12.5),
            ("t2", "Quarterly tax filing", "Globex", 120.0, 4.0),
            ("t3", "Mobile app prototype", "Initech", 85.0, 30.0),
        ]
        .into_iter()
        .map(|(id, name, client, rate, hours)| Task {
            id: id.to_string(),
            user_id: user_id.clone(),
            name: name.to_string(),
            client: client.to_string(),
            hourly_rate: rate,
            logged_hours: hours,
        })
        .collect();

        Self {
            records: RwLock::new(Records {
                tasks,
                ..Records::default()
            }),
        }
    }

    pub async fn add_task(&self, task: Task) {
        let mut records = self.records.write().await;
        records.tasks.retain(|t| t.id != task.id);
        records.tasks.push(task);
    }

    pub async fn tasks(&self, user_id: &UserId) -> Vec<Task> {
        let records = self.records.read().await;
        records
            .tasks
            .iter()
            .filter(|t| &t.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn task(&self, user_id: &UserId, task_id: &str) -> Option<Task> {
        let records = self.records.read().await;
        records
            .tasks
            .iter()
            .find(|t| &t.user_id == user_id && t.id == task_id)
            .cloned()
    }

    /// Issue a draft invoice for one of the user's tasks. `None` when the task
    /// does not exist for this user.
    pub async fn create_invoice(
        &self,
        user_id: &UserId,
        new: NewInvoice,
        now: DateTime<Utc>,
    ) -> Option<Invoice> {
        let mut records = self.records.write().await;
        let client = records
            .tasks
            .iter()
            .find(|t| &t.user_id == user_id && t.id == new.task_id)?
            .client
            .clone();

        records.next_invoice += 1;
        let invoice = Invoice {
            id: format!("inv-{}", records.next_invoice),
            user_id: user_id.clone(),
            task_id: new.task_id,
            client,
            hours: new.hours,
            rate: new.rate,
            total: (new.hours * new.rate * 100.0).round() / 100.0,
            month: new.month,
            year: new.year,
            status: "draft".to_string(),
            created_at: now,
        };
        records.invoices.push(invoice.clone());
        Some(invoice)
    }

    pub async fn invoices(&self, user_id: &UserId) -> Vec<Invoice> {
        let records = self.records.read().await;
        records
            .invoices
            .iter()
            .filter(|i| &i.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn create_reminder(
        &self,
        user_id: &UserId,
        title: &str,
        due_date: NaiveDate,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Reminder {
        let mut records = self.records.write().await;
        records.next_reminder += 1;
        let reminder = Reminder {
            id: format!("rem-{}", records.next_reminder),
            user_id: user_id.clone(),
            title: title.to_string(),
            due_date,
            note,
            created_at: now,
        };
        records.reminders.push(reminder.clone());
        reminder
    }

    /// The user's reminders, soonest first.
    pub async fn reminders(&self, user_id: &UserId) -> Vec<Reminder> {
        let records = self.records.read().await;
        let mut reminders: Vec<Reminder> = records
            .reminders
            .iter()
            .filter(|r| &r.user_id == user_id)
            .cloned()
            .collect();
        reminders.sort_by_key(|r| r.due_date);
        reminders
    }
}

#[async_trait]
impl EntityResolver for BusinessStore {
    async fn task_name(&self, user_id: &UserId, task_id: &str) -> Option<String> {
        self.task(user_id, task_id).await.map(|t| t.name)
    }
}
