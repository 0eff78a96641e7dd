//! Month grid for the time-series reports

use chrono::{Datelike, Months, NaiveDate};

/// Spanish month abbreviations indexed by `month0`.
const MONTH_LABELS: [&str; 12] =
    ["Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic"];

/// One month of a series grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthPoint {
    /// Last calendar day of the month.
    pub month_end: NaiveDate,
    /// Chart label, e.g. `Ene 25`.
    pub label: String,
}

/// Walks whole months from the month containing `from` to the month
/// containing `to`, inclusive. An inverted range yields no points.
pub fn month_points(from: NaiveDate, to: NaiveDate) -> Vec<MonthPoint> {
    let mut points = Vec::new();
    let mut current = from.with_day(1).unwrap_or(from);
    while current <= to {
        let Some(following) = current.checked_add_months(Months::new(1)) else {
            break;
        };
        let Some(month_end) = following.pred_opt() else {
            break;
        };
        points.push(MonthPoint { month_end, label: month_label(current) });
        current = following;
    }
    points
}

fn month_label(first_day: NaiveDate) -> String {
    format!("{} {:02}", MONTH_LABELS[first_day.month0() as usize], first_day.year() % 100)
}
