use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::models::{is_valid_category, Article, CATEGORY_OTHER};

/// Week-numbering convention used by the digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekConvention {
    /// strftime `%U`: week 1 starts on the year's first Sunday, days before
    /// it are week 0.
    SundayStart,
    #[allow(dead_code)]
    Iso8601,
}

/// Pinned here rather than assumed; grouping depends on it.
pub const WEEK_CONVENTION: WeekConvention = WeekConvention::SundayStart;

impl WeekConvention {
    pub fn week_of(self, date: NaiveDate) -> u32 {
        match self {
            WeekConvention::SundayStart => {
                (date.ordinal() + 6 - date.weekday().num_days_from_sunday()) / 7
            }
            WeekConvention::Iso8601 => date.iso_week().week(),
        }
    }
}

pub fn week_of_year(date: NaiveDate) -> u32 {
    WEEK_CONVENTION.week_of(date)
}

/// The compiled digest for one year: weeks ascending, each week's items
/// ordered by date then url. Pure data; rendering lives elsewhere.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Digest {
    pub year: i32,
    pub total: usize,
    pub weeks: Vec<WeekGroup>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WeekGroup {
    pub week: u32,
    pub badge: String,
    pub label: String,
    pub items: Vec<DigestItem>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DigestItem {
    pub url: String,
    pub title: String,
    pub date: NaiveDate,
    pub category: String,
    pub summary: String,
}

/// Compile approved articles into the weekly digest structure.
///
/// Deterministic for a given input: re-running over unchanged store contents
/// yields an identical structure. Articles without a usable date or summary
/// are dropped; a category missing from the taxonomy falls back to 其他.
pub fn compile(year: i32, articles: &[Article]) -> Digest {
    let mut items: Vec<DigestItem> = articles
        .iter()
        .filter_map(|article| {
            let date = article.date?;
            if date.year() != year {
                return None;
            }
            let summary = normalize_whitespace(article.summary.as_deref()?);
            if summary.is_empty() {
                return None;
            }

            let category = match article.category.as_deref() {
                Some(c) if is_valid_category(c) => c.to_string(),
                _ => CATEGORY_OTHER.to_string(),
            };

            Some(DigestItem {
                url: article.url.clone(),
                title: normalize_whitespace(article.title.as_deref().unwrap_or("")),
                date,
                category,
                summary,
            })
        })
        .collect();

    items.sort_by(|a, b| (a.date, a.url.as_str()).cmp(&(b.date, b.url.as_str())));
    let total = items.len();

    let mut weeks: Vec<WeekGroup> = Vec::new();
    for item in items {
        let week = week_of_year(item.date);
        match weeks.last_mut() {
            Some(group) if group.week == week => group.items.push(item),
            _ => weeks.push(WeekGroup {
                week,
                badge: week_badge(week),
                label: week_label_zh(week),
                items: vec![item],
            }),
        }
    }

    Digest { year, total, weeks }
}

pub fn week_badge(week: u32) -> String {
    format!("W{week:02}")
}

pub fn week_label_zh(week: u32) -> String {
    format!("第{}周", zh_number(week))
}

/// Chinese numeral for 0..=99; larger values stay arabic (weeks never get
/// there).
fn zh_number(value: u32) -> String {
    const DIGITS: [&str; 10] = ["零", "一", "二", "三", "四", "五", "六", "七", "八", "九"];

    if value > 99 {
        return value.to_string();
    }
    if value < 10 {
        return DIGITS[value as usize].to_string();
    }

    let tens = (value / 10) as usize;
    let ones = (value % 10) as usize;
    let prefix = if tens == 1 {
        "十".to_string()
    } else {
        format!("{}十", DIGITS[tens])
    };

    if ones == 0 {
        prefix
    } else {
        format!("{prefix}{}", DIGITS[ones])
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
