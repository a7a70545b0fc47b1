//! Where a farmer stands in a cultivation plan on a given day.

use chrono::NaiveDate;
use db::models::cultivation_plan::{DailyTask, WeeklyTask};
use serde::Serialize;
use ts_rs::TS;

pub const FALLBACK_ICON: &str = "Check";
pub const IDLE_DAY_ICON: &str = "Calendar";

/// Icons the client bundles. The cultivation plan prompt lists them; anything else is replaced.
pub const KNOWN_ICONS: &[&str] = &[
    "AlertTriangle",
    "Apple",
    "Axe",
    "Banknote",
    "Bean",
    "Beaker",
    "Bird",
    "Bug",
    "Calendar",
    "Carrot",
    "Check",
    "CheckCircle2",
    "Cherry",
    "ClipboardCheck",
    "ClipboardList",
    "Cloud",
    "CloudRain",
    "CloudSun",
    "Container",
    "Droplet",
    "Droplets",
    "Eye",
    "Fence",
    "FlaskConical",
    "Flower",
    "Flower2",
    "Grape",
    "Hammer",
    "Leaf",
    "Microscope",
    "Milk",
    "Mountain",
    "Package",
    "Pickaxe",
    "Pill",
    "Rat",
    "Recycle",
    "Scale",
    "Scissors",
    "Search",
    "Shield",
    "ShieldCheck",
    "ShoppingBasket",
    "Shovel",
    "Snowflake",
    "SprayCan",
    "Sprout",
    "Store",
    "Sun",
    "Sunrise",
    "Syringe",
    "TestTube",
    "Thermometer",
    "Timer",
    "Tractor",
    "TreeDeciduous",
    "Trees",
    "Truck",
    "Warehouse",
    "Waves",
    "Wheat",
    "Wind",
    "Wrench",
];

/// Week number (1-based) that `today` falls in, counting from the sowing date.
///
/// Dates before sowing count as week 1.
pub fn week_of_sowing(sowing_date: NaiveDate, today: NaiveDate) -> u32 {
    let days = (today - sowing_date).num_days();
    if days < 0 {
        return 1;
    }
    u32::try_from(days / 7 + 1).unwrap_or(u32::MAX)
}

/// Canonical icon name, accepting kebab-case (`cloud-rain`) as well as PascalCase.
pub fn resolve_icon(name: &str) -> &'static str {
    let name = name.trim();
    if let Some(known) = KNOWN_ICONS.iter().find(|icon| **icon == name) {
        return known;
    }
    let pascal: String = name
        .split(['-', '_', ' '])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect();
    KNOWN_ICONS
        .iter()
        .find(|icon| **icon == pascal)
        .copied()
        .unwrap_or(FALLBACK_ICON)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum WeekState {
    Past,
    Active,
    Upcoming,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct DayView {
    pub day: String,
    pub tasks: String,
    #[ts(type = "string")]
    pub icon_name: &'static str,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct WeekView {
    pub week: u32,
    pub stage: String,
    pub tasks: String,
    #[ts(type = "string")]
    pub icon_name: &'static str,
    pub state: WeekState,
    pub daily_tasks: Vec<DayView>,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct PlanProgress {
    pub current_week: u32,
    pub total_weeks: u32,
    /// `current_week` clamped to the plan length.
    pub displayed_week: u32,
    pub percent: f64,
    pub weeks: Vec<WeekView>,
}

impl PlanProgress {
    pub fn compute(plan: &[WeeklyTask], sowing_date: NaiveDate, today: NaiveDate) -> Self {
        let current_week = week_of_sowing(sowing_date, today);
        let total_weeks = u32::try_from(plan.len()).unwrap_or(u32::MAX);
        let displayed_week = current_week.min(total_weeks);
        let percent = if total_weeks == 0 {
            0.0
        } else {
            f64::from(displayed_week) / f64::from(total_weeks) * 100.0
        };

        let weeks = plan
            .iter()
            .zip(1u32..)
            .map(|(week, number)| WeekView {
                week: number,
                stage: week.stage.clone(),
                tasks: week.tasks.clone(),
                icon_name: resolve_icon(&week.icon_name),
                state: match number.cmp(&current_week) {
                    std::cmp::Ordering::Less => WeekState::Past,
                    std::cmp::Ordering::Equal => WeekState::Active,
                    std::cmp::Ordering::Greater => WeekState::Upcoming,
                },
                daily_tasks: week.daily_tasks.iter().map(day_view).collect(),
            })
            .collect();

        Self {
            current_week,
            total_weeks,
            displayed_week,
            percent,
            weeks,
        }
    }
}

fn day_view(day: &DailyTask) -> DayView {
    let icon_name = if day.tasks.trim().is_empty() {
        IDLE_DAY_ICON
    } else {
        resolve_icon(&day.icon_name)
    };
    DayView {
        day: day.day.clone(),
        tasks: day.tasks.clone(),
        icon_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn week(stage: &str, icon: &str) -> WeeklyTask {
        WeeklyTask {
            stage: stage.to_string(),
            tasks: format!("{stage} tasks"),
            icon_name: icon.to_string(),
            daily_tasks: vec![
                DailyTask {
                    day: "Monday".to_string(),
                    tasks: "Irrigate lightly".to_string(),
                    icon_name: "droplets".to_string(),
                },
                DailyTask {
                    day: "Tuesday".to_string(),
                    tasks: String::new(),
                    icon_name: "Droplets".to_string(),
                },
            ],
        }
    }

    #[test]
    fn week_of_sowing_counts_from_one() {
        let sown = date(2025, 6, 1);
        assert_eq!(week_of_sowing(sown, date(2025, 6, 1)), 1);
        assert_eq!(week_of_sowing(sown, date(2025, 6, 7)), 1);
        assert_eq!(week_of_sowing(sown, date(2025, 6, 8)), 2);
        assert_eq!(week_of_sowing(sown, date(2025, 7, 6)), 6);
    }

    #[test]
    fn week_of_sowing_clamps_future_sowing_to_week_one() {
        assert_eq!(week_of_sowing(date(2025, 6, 1), date(2025, 5, 1)), 1);
    }

    #[test]
    fn icons_fall_back_to_check() {
        assert_eq!(resolve_icon("Tractor"), "Tractor");
        assert_eq!(resolve_icon("cloud-rain"), "CloudRain");
        assert_eq!(resolve_icon("Spaceship"), FALLBACK_ICON);
        assert_eq!(resolve_icon(""), FALLBACK_ICON);
    }

    #[test]
    fn common_field_icons_are_kept() {
        for icon in ["ClipboardCheck", "Bird", "Pill", "Sprout", "Bug"] {
            assert_eq!(resolve_icon(icon), icon);
        }
        assert_eq!(resolve_icon("clipboard-check"), "ClipboardCheck");
    }

    #[test]
    fn progress_marks_weeks_and_clamps_past_the_end() {
        let plan = vec![
            week("Land Prep", "Tractor"),
            week("Sowing", "sprout"),
            week("Harvesting", "Combine"),
        ];
        let sown = date(2025, 6, 1);

        let mid = PlanProgress::compute(&plan, sown, date(2025, 6, 10));
        assert_eq!(mid.current_week, 2);
        assert_eq!(mid.displayed_week, 2);
        let states: Vec<WeekState> = mid.weeks.iter().map(|w| w.state).collect();
        assert_eq!(
            states,
            vec![WeekState::Past, WeekState::Active, WeekState::Upcoming]
        );
        assert_eq!(mid.weeks[1].icon_name, "Sprout");
        assert_eq!(mid.weeks[2].icon_name, FALLBACK_ICON);
        assert_eq!(mid.weeks[0].daily_tasks[0].icon_name, "Droplets");
        assert_eq!(mid.weeks[0].daily_tasks[1].icon_name, IDLE_DAY_ICON);

        let late = PlanProgress::compute(&plan, sown, date(2025, 9, 1));
        assert_eq!(late.displayed_week, 3);
        assert!((late.percent - 100.0).abs() < f64::EPSILON);
        assert!(late.weeks.iter().all(|w| w.state == WeekState::Past));
    }

    #[test]
    fn empty_plan_has_zero_percent() {
        let progress = PlanProgress::compute(&[], date(2025, 6, 1), date(2025, 6, 20));
        assert_eq!(progress.total_weeks, 0);
        assert_eq!(progress.displayed_week, 0);
        assert_eq!(progress.percent, 0.0);
    }
}
