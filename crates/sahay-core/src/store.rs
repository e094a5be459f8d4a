//! Data access for the scoring engine
//!
//! `StudentDataSource` is the seam between scoring and persistence. The
//! in-memory implementation backs the CLI and tests and can be loaded from a
//! JSON dataset.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{
    BudgetPlan, ExpenseRecord, RiskScoreSnapshot, Scholarship, ScholarshipApplication,
    StudentProfile,
};

/// Read/write access to the records the engine scores over
#[async_trait]
pub trait StudentDataSource: Send + Sync {
    /// Fetch a student, or `Error::NotFound`
    async fn student(&self, id: i64) -> Result<StudentProfile>;

    /// All students, ordered by id
    async fn list_students(&self) -> Result<Vec<StudentProfile>>;

    /// Expenses dated within `[start, end]`, ordered by date
    async fn expenses_between(
        &self,
        student_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ExpenseRecord>>;

    /// Every budget owned by the student, any status
    async fn budgets(&self, student_id: i64) -> Result<Vec<BudgetPlan>>;

    async fn budget(&self, budget_id: i64) -> Result<BudgetPlan>;

    async fn save_budget(&self, plan: BudgetPlan) -> Result<()>;

    async fn applications(&self, student_id: i64) -> Result<Vec<ScholarshipApplication>>;

    async fn scholarships(&self) -> Result<Vec<Scholarship>>;

    /// Overwrite the student's latest risk snapshot
    async fn save_snapshot(&self, student_id: i64, snapshot: RiskScoreSnapshot) -> Result<()>;
}

/// Serializable bundle of records
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub students: Vec<StudentProfile>,
    pub expenses: Vec<ExpenseRecord>,
    pub budgets: Vec<BudgetPlan>,
    pub scholarships: Vec<Scholarship>,
    pub applications: Vec<ScholarshipApplication>,
}

impl Dataset {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Reject malformed records and dangling student or scholarship references
    pub fn validate(&self) -> Result<()> {
        let mut ids = std::collections::HashSet::new();
        for student in &self.students {
            if !ids.insert(student.id) {
                return Err(Error::Validation(format!(
                    "Duplicate student id {}",
                    student.id
                )));
            }
        }

        let known = |student_id: i64, what: &str, id: i64| -> Result<()> {
            if ids.contains(&student_id) {
                Ok(())
            } else {
                Err(Error::Validation(format!(
                    "{} {} references unknown student {}",
                    what, id, student_id
                )))
            }
        };

        for expense in &self.expenses {
            expense.validate()?;
            known(expense.student_id, "Expense", expense.id)?;
        }
        for plan in &self.budgets {
            plan.validate()?;
            known(plan.student_id, "Budget", plan.id)?;
        }

        let mut scholarship_ids = std::collections::HashSet::new();
        for scholarship in &self.scholarships {
            scholarship.validate()?;
            if !scholarship_ids.insert(scholarship.id) {
                return Err(Error::Validation(format!(
                    "Duplicate scholarship id {}",
                    scholarship.id
                )));
            }
        }

        for application in &self.applications {
            known(application.student_id, "Application", application.id)?;
            if !scholarship_ids.contains(&application.scholarship_id) {
                return Err(Error::Validation(format!(
                    "Application {} references unknown scholarship {}",
                    application.id, application.scholarship_id
                )));
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct Tables {
    students: BTreeMap<i64, StudentProfile>,
    expenses: HashMap<i64, Vec<ExpenseRecord>>,
    budgets: BTreeMap<i64, BudgetPlan>,
    scholarships: BTreeMap<i64, Scholarship>,
    applications: HashMap<i64, Vec<ScholarshipApplication>>,
}

/// In-memory data source (last write wins on snapshots and budgets)
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a validated dataset
    pub fn from_dataset(dataset: Dataset) -> Result<Self> {
        dataset.validate()?;

        let mut tables = Tables::default();
        for student in dataset.students {
            tables.students.insert(student.id, student);
        }
        for expense in dataset.expenses {
            tables
                .expenses
                .entry(expense.student_id)
                .or_default()
                .push(expense);
        }
        for plan in dataset.budgets {
            tables.budgets.insert(plan.id, plan);
        }
        for scholarship in dataset.scholarships {
            tables.scholarships.insert(scholarship.id, scholarship);
        }
        for application in dataset.applications {
            tables
                .applications
                .entry(application.student_id)
                .or_default()
                .push(application);
        }

        debug!(
            students = tables.students.len(),
            budgets = tables.budgets.len(),
            scholarships = tables.scholarships.len(),
            "Loaded dataset"
        );

        Ok(Self {
            tables: RwLock::new(tables),
        })
    }

    pub async fn insert_student(&self, student: StudentProfile) {
        self.tables.write().await.students.insert(student.id, student);
    }

    pub async fn insert_expense(&self, expense: ExpenseRecord) -> Result<()> {
        expense.validate()?;
        self.tables
            .write()
            .await
            .expenses
            .entry(expense.student_id)
            .or_default()
            .push(expense);
        Ok(())
    }

    pub async fn insert_scholarship(&self, scholarship: Scholarship) -> Result<()> {
        scholarship.validate()?;
        self.tables
            .write()
            .await
            .scholarships
            .insert(scholarship.id, scholarship);
        Ok(())
    }

    pub async fn insert_application(&self, application: ScholarshipApplication) {
        self.tables
            .write()
            .await
            .applications
            .entry(application.student_id)
            .or_default()
            .push(application);
    }

    /// Export the current contents
    pub async fn to_dataset(&self) -> Dataset {
        let tables = self.tables.read().await;
        let mut expenses: Vec<ExpenseRecord> =
            tables.expenses.values().flatten().cloned().collect();
        expenses.sort_by_key(|e| (e.student_id, e.date, e.id));
        let mut applications: Vec<ScholarshipApplication> =
            tables.applications.values().flatten().cloned().collect();
        applications.sort_by_key(|a| a.id);

        Dataset {
            students: tables.students.values().cloned().collect(),
            expenses,
            budgets: tables.budgets.values().cloned().collect(),
            scholarships: tables.scholarships.values().cloned().collect(),
            applications,
        }
    }
}

fn student_not_found(id: i64) -> Error {
    Error::NotFound(format!("Student {} not found", id))
}

#[async_trait]
impl StudentDataSource for InMemoryStore {
    async fn student(&self, id: i64) -> Result<StudentProfile> {
        self.tables
            .read()
            .await
            .students
            .get(&id)
            .cloned()
            .ok_or_else(|| student_not_found(id))
    }

    async fn list_students(&self) -> Result<Vec<StudentProfile>> {
        Ok(self.tables.read().await.students.values().cloned().collect())
    }

    async fn expenses_between(
        &self,
        student_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ExpenseRecord>> {
        let tables = self.tables.read().await;
        if !tables.students.contains_key(&student_id) {
            return Err(student_not_found(student_id));
        }

        let mut expenses: Vec<ExpenseRecord> = tables
            .expenses
            .get(&student_id)
            .map(|list| {
                list.iter()
                    .filter(|e| e.date >= start && e.date <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        expenses.sort_by_key(|e| (e.date, e.id));
        Ok(expenses)
    }

    async fn budgets(&self, student_id: i64) -> Result<Vec<BudgetPlan>> {
        let tables = self.tables.read().await;
        if !tables.students.contains_key(&student_id) {
            return Err(student_not_found(student_id));
        }
        Ok(tables
            .budgets
            .values()
            .filter(|b| b.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn budget(&self, budget_id: i64) -> Result<BudgetPlan> {
        self.tables
            .read()
            .await
            .budgets
            .get(&budget_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Budget {} not found", budget_id)))
    }

    async fn save_budget(&self, plan: BudgetPlan) -> Result<()> {
        plan.validate()?;
        let mut tables = self.tables.write().await;
        if !tables.students.contains_key(&plan.student_id) {
            return Err(student_not_found(plan.student_id));
        }
        tables.budgets.insert(plan.id, plan);
        Ok(())
    }

    async fn applications(&self, student_id: i64) -> Result<Vec<ScholarshipApplication>> {
        Ok(self
            .tables
            .read()
            .await
            .applications
            .get(&student_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn scholarships(&self) -> Result<Vec<Scholarship>> {
        Ok(self
            .tables
            .read()
            .await
            .scholarships
            .values()
            .cloned()
            .collect())
    }

    async fn save_snapshot(&self, student_id: i64, snapshot: RiskScoreSnapshot) -> Result<()> {
        let mut tables = self.tables.write().await;
        let student = tables
            .students
            .get_mut(&student_id)
            .ok_or_else(|| student_not_found(student_id))?;
        student.latest_risk = Some(snapshot);
        Ok(())
    }
}
