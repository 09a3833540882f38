//! Canonical account and category names, the fixed fallback lists used when the ledger sheet
//! cannot be reached, and the quick-entry synonym table.

/// The income category that carries worked hours.
pub(crate) const WAGE_CATEGORY: &str = "Wages/Tips";

/// Accounts offered when the reference sheet cannot be fetched.
pub(crate) const FALLBACK_ACCOUNTS: &[&str] = &["Cash", "Card", "Savings"];

/// Expense categories offered when the reference sheet cannot be fetched.
pub(crate) const FALLBACK_EXPENSE_CATEGORIES: &[&str] = &[
    "Products",
    "Cafe",
    "Transport",
    "Taxi",
    "Leisure",
    "Shopping",
    "Health",
    "Pharmacy",
    "Utilities",
    "Communication",
];

/// Income categories offered when the budget sheet cannot be fetched. This is also the fixed
/// set that decides whether a quick-entry line is income.
pub(crate) const FALLBACK_INCOME_CATEGORIES: &[&str] = &[WAGE_CATEGORY, "Side Job", "Other"];

/// The short list of frequent expense categories shown first, before "all categories".
pub(crate) const QUICK_EXPENSE_CATEGORIES: &[&str] =
    &["Products", "Cafe", "Transport", "Taxi", "Leisure", "Shopping"];

/// Maps a lowercased quick-entry token to its canonical category name. The match is exact, no
/// fuzzy matching; tokens not in this table are not rejected, they become new categories via
/// [`capitalize`].
pub(crate) fn canonical_category(token: &str) -> Option<&'static str> {
    let canonical = match token {
        // income
        "tips" | "tip" | "chaevye" | "salary" | "wage" | "wages" | "zarplata" | "zp"
        | "wages/tips" => WAGE_CATEGORY,
        "sidejob" | "gig" | "podrabotka" => "Side Job",
        // expenses
        "products" | "food" | "groceries" | "grocery" | "store" | "eda" | "magazin" => "Products",
        "cafe" | "coffee" | "restaurant" | "kafe" => "Cafe",
        "transport" | "metro" | "bus" => "Transport",
        "taxi" | "cab" => "Taxi",
        "leisure" | "fun" | "games" | "dosug" => "Leisure",
        "shopping" | "purchases" | "pokupki" => "Shopping",
        "health" | "beauty" => "Health",
        "pharmacy" | "meds" | "apteka" => "Pharmacy",
        "rent" | "arenda" => "Rent",
        "utilities" | "kommunalka" => "Utilities",
        "communication" | "internet" | "phone" | "mobile" | "svyaz" => "Communication",
        "clothes" | "clothing" => "Clothes",
        "debt" | "debts" | "dolgi" => "Debts",
        "cats" | "koshki" => "Cats",
        "other" => "Other",
        _ => return None,
    };
    Some(canonical)
}

/// True when `name` is one of the fixed income categories.
pub(crate) fn is_income_category(name: &str) -> bool {
    FALLBACK_INCOME_CATEGORIES.contains(&name)
}

/// Clones one of the static fallback lists into owned strings.
pub(crate) fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

/// Uppercases the first character, leaving the rest alone.
pub(crate) fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synonyms_map_to_canonical() {
        assert_eq!(canonical_category("tips"), Some("Wages/Tips"));
        assert_eq!(canonical_category("zp"), Some("Wages/Tips"));
        assert_eq!(canonical_category("eda"), Some("Products"));
        assert_eq!(canonical_category("magazin"), Some("Products"));
        assert_eq!(canonical_category("metro"), Some("Transport"));
    }

    #[test]
    fn test_lookup_is_exact() {
        assert_eq!(canonical_category("Tips"), None);
        assert_eq!(canonical_category("tipss"), None);
        assert_eq!(canonical_category(""), None);
    }

    #[test]
    fn test_income_set() {
        assert!(is_income_category("Wages/Tips"));
        assert!(is_income_category("Side Job"));
        assert!(!is_income_category("Products"));
        assert!(!is_income_category("wages/tips"));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("books"), "Books");
        assert_eq!(capitalize("x"), "X");
        assert_eq!(capitalize(""), "");
    }
}
