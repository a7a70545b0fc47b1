use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type, types::Json};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "plan_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlanStatus {
    #[default]
    Active,
    Completed,
    Archived,
}

/// One day of a cultivation week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
pub struct DailyTask {
    /// Day of the week, e.g. "Monday".
    pub day: String,
    /// A simple, actionable task for the day. Empty when there is nothing to do.
    pub tasks: String,
    /// Icon from the allowed Lucide list for the day's main action, e.g. "Droplets" or "Bug". "Calendar" on days without tasks.
    pub icon_name: String,
}

/// One week of a cultivation plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
pub struct WeeklyTask {
    /// Short name of the cultivation stage, e.g. "Land Prep", "Growth", "Harvesting".
    pub stage: String,
    /// Detailed, actionable tasks and advice for the week, in simple language.
    pub tasks: String,
    /// Icon from the allowed Lucide list for the week's main action, e.g. "Tractor", "ClipboardCheck", "Wheat".
    pub icon_name: String,
    /// Seven daily entries starting with Monday.
    #[serde(default)]
    pub daily_tasks: Vec<DailyTask>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct CultivationPlan {
    pub id: Uuid,
    pub owner_id: String,
    pub farm_id: Option<Uuid>,
    pub crop_type: String,
    pub district: String,
    pub sowing_date: NaiveDate,
    #[ts(as = "Vec<WeeklyTask>")]
    pub plan: Json<Vec<WeeklyTask>>,
    pub status: PlanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateCultivationPlan {
    pub farm_id: Option<Uuid>,
    pub crop_type: String,
    pub district: String,
    pub sowing_date: NaiveDate,
    pub plan: Vec<WeeklyTask>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateCultivationPlan {
    pub status: Option<PlanStatus>,
    pub sowing_date: Option<NaiveDate>,
    pub plan: Option<Vec<WeeklyTask>>,
}

impl CultivationPlan {
    pub fn weeks(&self) -> &[WeeklyTask] {
        &self.plan.0
    }

    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        owner_id: &str,
        data: &CreateCultivationPlan,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, CultivationPlan>(
            r#"INSERT INTO cultivation_plans
                (id, owner_id, farm_id, crop_type, district, sowing_date, plan, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING *"#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(data.farm_id)
        .bind(&data.crop_type)
        .bind(&data.district)
        .bind(data.sowing_date)
        .bind(Json(&data.plan))
        .bind(PlanStatus::Active)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, CultivationPlan>("SELECT * FROM cultivation_plans WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Newest first.
    pub async fn find_by_owner_id(
        pool: &SqlitePool,
        owner_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, CultivationPlan>(
            "SELECT * FROM cultivation_plans WHERE owner_id = $1 ORDER BY created_at DESC, rowid DESC",
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateCultivationPlan,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, CultivationPlan>(
            r#"UPDATE cultivation_plans SET
                status = COALESCE($2, status),
                sowing_date = COALESCE($3, sowing_date),
                plan = COALESCE($4, plan),
                updated_at = $5
            WHERE id = $1
            RETURNING *"#,
        )
        .bind(id)
        .bind(data.status)
        .bind(data.sowing_date)
        .bind(data.plan.as_ref().map(Json))
        .bind(Utc::now())
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    fn week(stage: &str) -> WeeklyTask {
        WeeklyTask {
            stage: stage.to_string(),
            tasks: "Plough twice and level the field.".to_string(),
            icon_name: "Tractor".to_string(),
            daily_tasks: vec![DailyTask {
                day: "Monday".to_string(),
                tasks: String::new(),
                icon_name: "Calendar".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn stores_plan_json_and_archives() {
        let db = DBService::in_memory().await.unwrap();
        let plan = CultivationPlan::create(
            &db.pool,
            Uuid::new_v4(),
            "u1",
            &CreateCultivationPlan {
                farm_id: None,
                crop_type: "Tomato".to_string(),
                district: "Nashik".to_string(),
                sowing_date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
                plan: vec![week("Land Prep"), week("Sowing")],
            },
        )
        .await
        .unwrap();
        assert_eq!(plan.status, PlanStatus::Active);

        let loaded = CultivationPlan::find_by_id(&db.pool, plan.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.weeks().len(), 2);
        assert_eq!(loaded.weeks()[1].stage, "Sowing");

        let archived = CultivationPlan::update(
            &db.pool,
            plan.id,
            &UpdateCultivationPlan {
                status: Some(PlanStatus::Archived),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(archived.status, PlanStatus::Archived);
        assert_eq!(archived.weeks(), loaded.weeks());
    }
}
