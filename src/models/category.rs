/// The closed taxonomy of article categories, in display order.
pub const CATEGORIES: [&str; 8] = [
    "eda/ip",
    "设计",
    "制造",
    "设备",
    "材料",
    "封装",
    "IDM",
    "其他",
];

/// Fallback bucket for anything the taxonomy does not name.
pub const CATEGORY_OTHER: &str = "其他";

pub fn is_valid_category(category: &str) -> bool {
    CATEGORIES.contains(&category)
}

/// Human-facing name; only "eda/ip" differs from its stored form.
pub fn display_name(category: &str) -> &str {
    if category == "eda/ip" {
        "EDA/IP"
    } else {
        category
    }
}
