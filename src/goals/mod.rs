use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use crate::db::Database;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{GoalKind, GoalPriority, GoalStatus, SavingsGoal};

/// Input for a new goal.
#[derive(Debug, Clone)]
pub(crate) struct NewGoal {
    pub(crate) title: String,
    pub(crate) target_amount: Decimal,
    pub(crate) due_date: NaiveDate,
    pub(crate) description: String,
    pub(crate) current_amount: Decimal,
    pub(crate) kind: GoalKind,
    pub(crate) priority: GoalPriority,
}

impl NewGoal {
    pub(crate) fn new(title: impl Into<String>, target_amount: Decimal, due_date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            target_amount,
            due_date,
            description: String::new(),
            current_amount: Decimal::ZERO,
            kind: GoalKind::default(),
            priority: GoalPriority::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct GoalSummary {
    pub(crate) total: usize,
    pub(crate) active: usize,
    pub(crate) completed: usize,
    pub(crate) abandoned: usize,
    pub(crate) total_target: Decimal,
    pub(crate) total_saved: Decimal,
}

pub(crate) fn create(db: &Database, user_id: &str, new: NewGoal) -> LedgerResult<SavingsGoal> {
    let mut goal = SavingsGoal::new(user_id, new.title, new.target_amount, new.due_date);
    goal.description = new.description.trim().to_string();
    goal.current_amount = new.current_amount;
    goal.kind = new.kind;
    goal.priority = new.priority;
    goal.validate()?;
    goal.refresh_status();

    goal.id = Some(db.insert_goal(&goal)?);
    info!(user = %user_id, goal_id = ?goal.id, title = %goal.title, "Goal created");
    Ok(goal)
}

/// Add to (or withdraw from, when negative) a goal's saved amount.
pub(crate) fn contribute(
    db: &Database,
    user_id: &str,
    id: i64,
    amount: Decimal,
) -> LedgerResult<SavingsGoal> {
    let mut goal = get(db, user_id, id)?;
    if goal.status == GoalStatus::Abandoned {
        return Err(LedgerError::Validation(format!(
            "Goal '{}' is abandoned",
            goal.title
        )));
    }
    let was = goal.status;
    goal.contribute(amount)?;
    db.update_goal(&goal)?;
    if was != goal.status {
        info!(user = %user_id, goal_id = id, "Goal completed");
    }
    Ok(goal)
}

pub(crate) fn abandon(db: &Database, user_id: &str, id: i64) -> LedgerResult<SavingsGoal> {
    let mut goal = get(db, user_id, id)?;
    goal.status = GoalStatus::Abandoned;
    db.update_goal(&goal)?;
    info!(user = %user_id, goal_id = id, "Goal abandoned");
    Ok(goal)
}

pub(crate) fn delete(db: &Database, user_id: &str, id: i64) -> LedgerResult<()> {
    if !db.delete_goal(user_id, id)? {
        return Err(goal_not_found(id));
    }
    info!(user = %user_id, goal_id = id, "Goal deleted");
    Ok(())
}

pub(crate) fn get(db: &Database, user_id: &str, id: i64) -> LedgerResult<SavingsGoal> {
    db.get_goal(user_id, id)?.ok_or_else(|| goal_not_found(id))
}

/// Goals ordered by due date, optionally one status only.
pub(crate) fn list(
    db: &Database,
    user_id: &str,
    status: Option<GoalStatus>,
) -> LedgerResult<Vec<SavingsGoal>> {
    Ok(db.get_goals(user_id, status)?)
}

pub(crate) fn summary(db: &Database, user_id: &str) -> LedgerResult<GoalSummary> {
    let goals = db.get_goals(user_id, None)?;
    let mut s = GoalSummary {
        total: goals.len(),
        ..Default::default()
    };
    for g in &goals {
        match g.status {
            GoalStatus::Active => s.active += 1,
            GoalStatus::Completed => s.completed += 1,
            GoalStatus::Abandoned => s.abandoned += 1,
        }
        s.total_target += g.target_amount;
        s.total_saved += g.current_amount;
    }
    Ok(s)
}

fn goal_not_found(id: i64) -> LedgerError {
    LedgerError::NotFound(format!("Goal {id} not found"))
}
